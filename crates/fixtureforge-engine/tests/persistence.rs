mod common;

use fixtureforge_core::{FieldDescription, FieldKind, ModelDescription, Value};
use fixtureforge_engine::{Overrides, StoreError, SynthesisError};

use common::{catalog_of, engine_store, init_tracing, nullable_pair, serial_model, FailingStore};

#[test]
fn store_rejections_propagate_uninterpreted() {
    init_tracing();
    let catalog = catalog_of(vec![nullable_pair()]);
    let mut engine = fixtureforge_engine::FixtureEngine::new(catalog);
    let mut store = FailingStore;

    let err = engine
        .create(&mut store, "fixtures.pair", &Overrides::new())
        .unwrap_err();
    match err {
        SynthesisError::PersistenceFailed { model, source } => {
            assert_eq!(model, "fixtures.pair");
            assert!(matches!(source, StoreError::Rejected(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn failed_persists_leave_the_ledger_untouched() {
    init_tracing();
    let catalog = catalog_of(vec![serial_model()]);
    let mut engine = fixtureforge_engine::FixtureEngine::new(catalog);
    let mut store = FailingStore;

    let err = engine
        .create(&mut store, "fixtures.serial", &Overrides::new())
        .unwrap_err();
    assert!(matches!(err, SynthesisError::PersistenceFailed { .. }));
    assert!(engine.ledger().is_empty());
}

#[test]
fn conflicts_on_generated_values_are_retried() {
    let (mut engine, mut store) = engine_store(vec![serial_model()]);

    engine
        .create(&mut store, "fixtures.serial", &Overrides::new())
        .unwrap();

    // dropping the ledger makes generation repeat its first candidate, so
    // the store conflict exercises the save retry path
    engine.reset_ledger();
    let retried = engine
        .create(&mut store, "fixtures.serial", &Overrides::new())
        .unwrap();

    assert!(retried.is_persisted());
    assert_ne!(retried.get("code").and_then(Value::as_i64), Some(1));
    assert_eq!(store.count("fixtures.serial"), 2);
}

#[test]
fn conflicts_on_overridden_values_are_fatal() {
    let (mut engine, mut store) = engine_store(vec![serial_model()]);

    let overrides = Overrides::new().set("code", Value::Int(1));
    engine
        .create(&mut store, "fixtures.serial", &overrides)
        .unwrap();

    let err = engine
        .create(&mut store, "fixtures.serial", &overrides)
        .unwrap_err();
    match err {
        SynthesisError::PersistenceFailed { source, .. } => {
            assert!(matches!(source, StoreError::Conflict(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.count("fixtures.serial"), 1);
}

#[test]
fn validation_failures_abort_before_any_save() {
    fn never(_instance: &fixtureforge_core::Instance) -> Result<(), String> {
        Err("rejected".to_string())
    }

    let model = ModelDescription::new("fixtures.guarded")
        .with_field(FieldDescription::new("code", FieldKind::Integer).unique())
        .with_clean(never);
    let (mut engine, mut store) = engine_store(vec![model]);

    let err = engine
        .create(&mut store, "fixtures.guarded", &Overrides::new())
        .unwrap_err();
    assert!(matches!(err, SynthesisError::ValidationFailed { .. }));
    assert_eq!(store.count("fixtures.guarded"), 0);
    assert!(engine.ledger().is_empty());
}

#[test]
fn file_fields_materialize_through_the_store() {
    let model = ModelDescription::new("fixtures.upload")
        .with_field(FieldDescription::new("file", FieldKind::File));
    let (mut engine, mut store) = engine_store(vec![model]);

    let instance = engine
        .create(&mut store, "fixtures.upload", &Overrides::new())
        .unwrap();

    let path = instance.get("file").and_then(Value::as_str).unwrap();
    assert!(path.starts_with("media/"));
    assert_eq!(store.files(), &[path.to_string()]);
}

#[test]
fn unknown_models_surface_catalog_errors() {
    let (mut engine, mut store) = engine_store(vec![nullable_pair()]);
    let err = engine
        .create(&mut store, "fixtures.missing", &Overrides::new())
        .unwrap_err();
    assert!(matches!(err, SynthesisError::Schema(_)));
    assert_eq!(store.count("fixtures.pair"), 0);
}
