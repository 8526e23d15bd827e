use serde::{Deserialize, Serialize};

/// Options for the fixture engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureOptions {
    /// Seed for the engine RNG; equal seeds give equal value streams.
    pub seed: u64,
    /// Generate values for nullable fields too instead of leaving them unset.
    pub fill_nullable: bool,
    /// Related instances created per to-many field.
    pub many_count: u32,
    /// Retry budget for uniqueness collisions during value generation.
    pub max_unique_attempts: u32,
    /// Retry budget for storage-level uniqueness conflicts on save.
    pub max_save_attempts: u32,
}

impl Default for FixtureOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            fill_nullable: false,
            many_count: 1,
            max_unique_attempts: 100,
            max_save_attempts: 3,
        }
    }
}
