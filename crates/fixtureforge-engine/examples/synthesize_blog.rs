use fixtureforge_core::{FieldDescription, FieldKind, ModelCatalog, ModelDescription};
use fixtureforge_engine::{FixtureEngine, InMemoryStore, Overrides};

fn main() {
    let mut catalog = ModelCatalog::new();
    catalog
        .register(
            ModelDescription::new("blog.author")
                .with_field(FieldDescription::new("name", FieldKind::Text))
                .with_field(FieldDescription::new("email", FieldKind::Email).unique()),
        )
        .expect("register author");
    catalog
        .register(
            ModelDescription::new("blog.post")
                .with_field(FieldDescription::new("title", FieldKind::Text))
                .with_field(FieldDescription::new("body", FieldKind::Text).nullable())
                .with_field(FieldDescription::foreign_key("author", "blog.author")),
        )
        .expect("register post");
    fixtureforge_core::validate_catalog(&catalog).expect("valid catalog");

    let mut store = InMemoryStore::new(catalog.clone());
    let mut engine = FixtureEngine::new(catalog);

    let post = engine
        .create(&mut store, "blog.post", &Overrides::new())
        .expect("synthesize post");

    let json = serde_json::to_string_pretty(&post).expect("serialize instance");
    println!("{json}");
}
