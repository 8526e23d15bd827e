use thiserror::Error;

/// Core error type shared across Fixtureforge crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Requested model is not registered in the catalog.
    #[error("unknown model: {0}")]
    UnknownModel(String),
    /// The catalog violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
}

/// Convenience alias for results returned by Fixtureforge crates.
pub type Result<T> = std::result::Result<T, Error>;
