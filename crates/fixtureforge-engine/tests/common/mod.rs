#![allow(dead_code)]

use std::sync::Once;

use fixtureforge_core::{
    Choice, FieldDescription, FieldKind, Identity, Instance, ModelCatalog, ModelDescription, Value,
};
use fixtureforge_engine::{FixtureEngine, FixtureOptions, InMemoryStore, Storage, StoreError};

pub fn init_tracing() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

pub fn catalog_of(models: Vec<ModelDescription>) -> ModelCatalog {
    let mut catalog = ModelCatalog::new();
    for model in models {
        catalog.register(model).expect("register model");
    }
    fixtureforge_core::validate_catalog(&catalog).expect("valid catalog");
    catalog
}

pub fn engine_store(models: Vec<ModelDescription>) -> (FixtureEngine, InMemoryStore) {
    engine_store_with(models, FixtureOptions::default())
}

pub fn engine_store_with(
    models: Vec<ModelDescription>,
    options: FixtureOptions,
) -> (FixtureEngine, InMemoryStore) {
    init_tracing();
    let catalog = catalog_of(models);
    let store = InMemoryStore::new(catalog.clone());
    (FixtureEngine::with_options(catalog, options), store)
}

/// Store whose save always fails, for persistence-propagation tests.
#[derive(Debug, Default)]
pub struct FailingStore;

impl Storage for FailingStore {
    fn save(&mut self, _instance: &mut Instance) -> Result<Identity, StoreError> {
        Err(StoreError::Rejected("save disabled".to_string()))
    }

    fn link(
        &mut self,
        _model: &str,
        _owner: Identity,
        _field: &str,
        _targets: &[Identity],
    ) -> Result<(), StoreError> {
        Err(StoreError::Rejected("link disabled".to_string()))
    }

    fn materialize_file(&mut self, _name: &str) -> Result<String, StoreError> {
        Err(StoreError::Rejected("files disabled".to_string()))
    }
}

// Model corpus shared across the suites.

/// `{nullable, not_nullable}` integer pair.
pub fn nullable_pair() -> ModelDescription {
    ModelDescription::new("fixtures.pair")
        .with_field(FieldDescription::new("nullable", FieldKind::Integer).nullable())
        .with_field(FieldDescription::new("not_nullable", FieldKind::Integer))
}

/// `{required, required_with_default = 1}` plus optional counterparts.
pub fn defaults_model() -> ModelDescription {
    ModelDescription::new("fixtures.defaults")
        .with_field(FieldDescription::new("required", FieldKind::Integer))
        .with_field(
            FieldDescription::new("required_with_default", FieldKind::Integer)
                .with_default(Value::Int(1)),
        )
        .with_field(FieldDescription::new("not_required", FieldKind::Integer).nullable())
        .with_field(
            FieldDescription::new("not_required_with_default", FieldKind::Integer)
                .nullable()
                .with_default(Value::Int(1)),
        )
}

pub fn choices_model() -> ModelDescription {
    let plain = vec![
        Choice::Leaf(Value::Text("a".to_string())),
        Choice::Leaf(Value::Text("b".to_string())),
    ];
    let grouped = vec![
        Choice::Group {
            label: "group1".to_string(),
            choices: vec![
                Choice::Leaf(Value::Text("a".to_string())),
                Choice::Leaf(Value::Text("b".to_string())),
            ],
        },
        Choice::Group {
            label: "group2".to_string(),
            choices: vec![
                Choice::Leaf(Value::Text("c".to_string())),
                Choice::Leaf(Value::Text("d".to_string())),
            ],
        },
    ];
    ModelDescription::new("fixtures.choices")
        .with_field(
            FieldDescription::new("string_with_choices", FieldKind::Text)
                .with_max_length(5)
                .with_choices(plain.clone()),
        )
        .with_field(
            FieldDescription::new("string_with_choices_and_default", FieldKind::Text)
                .with_max_length(5)
                .with_choices(plain)
                .with_default(Value::Text("b".to_string())),
        )
        .with_field(
            FieldDescription::new("string_with_optgroup_choices", FieldKind::Text)
                .with_max_length(5)
                .with_choices(grouped),
        )
}

/// One non-null unique integer, for ledger-driven distinctness.
pub fn serial_model() -> ModelDescription {
    ModelDescription::new("fixtures.serial")
        .with_field(FieldDescription::new("code", FieldKind::Integer).unique())
}

/// Unique single-character text column; the value space is tiny on purpose.
pub fn short_code_model() -> ModelDescription {
    ModelDescription::new("fixtures.short_code").with_field(
        FieldDescription::new("letter", FieldKind::Text)
            .with_max_length(1)
            .unique(),
    )
}

pub fn auto_dates_model() -> ModelDescription {
    ModelDescription::new("fixtures.auto_dates")
        .with_field(FieldDescription::new("auto_now_add", FieldKind::Date).auto_managed())
        .with_field(FieldDescription::new("auto_now", FieldKind::Date).auto_managed())
        .with_field(FieldDescription::new("label", FieldKind::Text))
}

pub fn clean_model() -> ModelDescription {
    fn clean(instance: &Instance) -> Result<(), String> {
        match instance.get("integer").and_then(Value::as_i64) {
            Some(9999) => Ok(()),
            _ => Err("integer is not 9999".to_string()),
        }
    }

    ModelDescription::new("fixtures.clean")
        .with_field(FieldDescription::new("integer", FieldKind::Integer))
        .with_clean(clean)
}

pub fn validators_model() -> ModelDescription {
    ModelDescription::new("fixtures.validators").with_field(
        FieldDescription::new("field_validator", FieldKind::Text)
            .with_max_length(3)
            .with_validator(fixtureforge_core::FieldValidator::Regex("ok".to_string())),
    )
}

/// `user <- order` with a required to-one reference.
pub fn user_and_order() -> Vec<ModelDescription> {
    vec![
        ModelDescription::new("fixtures.user")
            .with_field(FieldDescription::new("name", FieldKind::Text)),
        ModelDescription::new("fixtures.order")
            .with_field(FieldDescription::foreign_key("user", "fixtures.user")),
    ]
}

/// Self-referential nullable to-one plus scalar fields.
pub fn related_model() -> ModelDescription {
    ModelDescription::new("fixtures.related")
        .with_field(
            FieldDescription::foreign_key("selfforeignkey", "fixtures.related").nullable(),
        )
        .with_field(FieldDescription::new("integer", FieldKind::Integer).nullable())
        .with_field(FieldDescription::new("integer_b", FieldKind::Integer).nullable())
}

/// Non-nullable self-reference, unresolvable without an override.
pub fn node_model() -> ModelDescription {
    ModelDescription::new("fixtures.node")
        .with_field(FieldDescription::foreign_key("parent", "fixtures.node"))
}

/// Mutual non-nullable cycle.
pub fn mutual_cycle() -> Vec<ModelDescription> {
    vec![
        ModelDescription::new("fixtures.a")
            .with_field(FieldDescription::foreign_key("b", "fixtures.b")),
        ModelDescription::new("fixtures.b")
            .with_field(FieldDescription::foreign_key("a", "fixtures.a")),
    ]
}

/// Mutual nullable cycle, breakable at synthesis time.
pub fn nullable_cycle() -> Vec<ModelDescription> {
    vec![
        ModelDescription::new("fixtures.c")
            .with_field(FieldDescription::foreign_key("d", "fixtures.d").nullable()),
        ModelDescription::new("fixtures.d")
            .with_field(FieldDescription::foreign_key("c", "fixtures.c").nullable()),
    ]
}

/// `post <-> tag` directly and through an explicit join with an extra field.
pub fn post_tag_through() -> Vec<ModelDescription> {
    vec![
        ModelDescription::new("fixtures.post")
            .with_field(FieldDescription::new("title", FieldKind::Text))
            .with_field(FieldDescription::many_to_many_through(
                "tags",
                "fixtures.tag",
                "fixtures.tagging",
            )),
        ModelDescription::new("fixtures.tag")
            .with_field(FieldDescription::new("label", FieldKind::Text)),
        ModelDescription::new("fixtures.tagging")
            .with_field(FieldDescription::foreign_key("post", "fixtures.post"))
            .with_field(FieldDescription::foreign_key("tag", "fixtures.tag"))
            .with_field(FieldDescription::new("note", FieldKind::Text)),
    ]
}

pub fn post_tag_direct() -> Vec<ModelDescription> {
    vec![
        ModelDescription::new("fixtures.post")
            .with_field(FieldDescription::new("title", FieldKind::Text))
            .with_field(FieldDescription::many_to_many("tags", "fixtures.tag")),
        ModelDescription::new("fixtures.tag")
            .with_field(FieldDescription::new("label", FieldKind::Text)),
    ]
}

/// abstract base -> parent -> child chain.
pub fn inheritance_chain() -> Vec<ModelDescription> {
    vec![
        ModelDescription::new("fixtures.base")
            .with_field(FieldDescription::new("integer", FieldKind::Integer).unique()),
        ModelDescription::new("fixtures.parent").with_parent("fixtures.base"),
        ModelDescription::new("fixtures.child")
            .with_parent("fixtures.parent")
            .with_field(FieldDescription::new("own", FieldKind::Integer)),
    ]
}

/// `copy2 <- copy` per the copy-duplication property.
pub fn copy_models() -> Vec<ModelDescription> {
    vec![
        ModelDescription::new("fixtures.copy2")
            .with_field(FieldDescription::new("int_e", FieldKind::Integer)),
        ModelDescription::new("fixtures.copy")
            .with_field(FieldDescription::new("int_a", FieldKind::Integer))
            .with_field(FieldDescription::new("int_b", FieldKind::Integer))
            .with_field(FieldDescription::new("int_c", FieldKind::Integer))
            .with_field(FieldDescription::new("int_d", FieldKind::Integer))
            .with_field(FieldDescription::foreign_key("e", "fixtures.copy2")),
    ]
}

pub fn full_options() -> FixtureOptions {
    FixtureOptions {
        fill_nullable: true,
        ..FixtureOptions::default()
    }
}
