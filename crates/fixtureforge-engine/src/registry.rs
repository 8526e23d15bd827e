use fixtureforge_core::{FieldDescription, Value};

use crate::errors::SynthesisError;

/// Predicate deciding whether a plugin handles a field.
pub type KindPredicate = fn(&FieldDescription) -> bool;

/// Plugin generator: field description plus retry attempt to a value.
pub type FieldGenerator = fn(&FieldDescription, u32) -> Result<Value, SynthesisError>;

#[derive(Debug, Clone, Copy)]
struct PluginEntry {
    predicate: KindPredicate,
    generator: FieldGenerator,
    precedence: i32,
}

/// Open mapping from field-kind predicates to registered generators.
///
/// Entries are scanned by precedence (higher first), registration order
/// within a precedence level; the first matching predicate wins. Fields with
/// no match fall through to the built-in generators or, for custom kinds, to
/// `UnsupportedFieldKind`.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    entries: Vec<PluginEntry>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register at the default precedence (0).
    pub fn register(&mut self, predicate: KindPredicate, generator: FieldGenerator) {
        self.register_with_precedence(predicate, generator, 0);
    }

    /// Register with an explicit precedence so a later, more specific plugin
    /// can shadow an earlier generic one.
    pub fn register_with_precedence(
        &mut self,
        predicate: KindPredicate,
        generator: FieldGenerator,
        precedence: i32,
    ) {
        let entry = PluginEntry {
            predicate,
            generator,
            precedence,
        };
        let position = self
            .entries
            .iter()
            .position(|existing| existing.precedence < precedence)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, entry);
    }

    pub fn lookup(&self, field: &FieldDescription) -> Option<FieldGenerator> {
        self.entries
            .iter()
            .find(|entry| (entry.predicate)(field))
            .map(|entry| entry.generator)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
