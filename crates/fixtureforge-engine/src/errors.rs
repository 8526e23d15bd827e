use thiserror::Error;

use fixtureforge_core::FieldKind;

/// Errors raised by the persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage-level constraint violation. The engine treats this as
    /// retryable for generated values and fatal for overridden ones.
    #[error("constraint conflict: {0}")]
    Conflict(String),
    /// Any other rejection; never retried.
    #[error("store rejected instance: {0}")]
    Rejected(String),
    #[error("unknown model: {0}")]
    UnknownModel(String),
}

/// Errors emitted by the synthesis engine.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// No built-in generator or registered plugin matches the field kind.
    #[error("no generator for field '{field}' of kind {kind:?}")]
    UnsupportedFieldKind { field: String, kind: FieldKind },
    /// The bounded uniqueness retry budget was exceeded.
    #[error("exhausted uniqueness retries for '{model}.{field}' after {attempts} attempts")]
    ExhaustedUniquenessRetries {
        model: String,
        field: String,
        attempts: u32,
    },
    /// A non-nullable reference cycle that no override breaks.
    #[error("cyclic dependency at '{model}.{field}'")]
    CyclicDependency { model: String, field: String },
    /// The model's validation hook or a field validator rejected the instance.
    #[error("validation failed for '{model}': {message}")]
    ValidationFailed { model: String, message: String },
    /// The persistence collaborator rejected the instance.
    #[error("persistence failed for '{model}': {source}")]
    PersistenceFailed {
        model: String,
        #[source]
        source: StoreError,
    },
    #[error(transparent)]
    Schema(#[from] fixtureforge_core::Error),
}
