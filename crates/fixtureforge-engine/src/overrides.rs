use std::collections::BTreeMap;

use fixtureforge_core::Value;

/// Caller-supplied value for one field: a literal applied verbatim, or a
/// nested override set forwarded to the related model's synthesis.
#[derive(Debug, Clone)]
pub enum OverrideValue {
    Literal(Value),
    Nested(Overrides),
}

/// Field overrides for one synthesis call.
///
/// Literal overrides take precedence over every generation policy and bypass
/// uniqueness and default handling; nested overrides are passed through to
/// the related model unchanged.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    entries: BTreeMap<String, OverrideValue>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chainable literal override.
    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.insert(field, OverrideValue::Literal(value));
        self
    }

    /// Chainable nested override for a related model.
    pub fn set_nested(mut self, field: impl Into<String>, nested: Overrides) -> Self {
        self.insert(field, OverrideValue::Nested(nested));
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: OverrideValue) {
        self.entries.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&OverrideValue> {
        self.entries.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.entries.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OverrideValue)> {
        self.entries.iter()
    }

    /// Copy every entry of `other` over this set; `other` wins on clashes.
    pub fn extend_from(&mut self, other: &Overrides) {
        for (field, value) in &other.entries {
            self.entries.insert(field.clone(), value.clone());
        }
    }
}
