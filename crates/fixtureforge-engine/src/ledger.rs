use std::collections::{BTreeMap, BTreeSet};

use fixtureforge_core::Value;

/// Process-scoped record of unique values already emitted per (model, field).
///
/// Read before every uniqueness-constrained generation, written only after a
/// successful persist. The ledger grows monotonically; callers reset it
/// explicitly between test runs. Concurrent use requires an external mutex
/// around read-check-write.
#[derive(Debug, Clone, Default)]
pub struct UniquenessLedger {
    used: BTreeMap<String, BTreeSet<String>>,
}

impl UniquenessLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, model: &str, field: &str, value: &Value) -> bool {
        self.used
            .get(&slot_key(model, field))
            .is_some_and(|values| values.contains(&value.key()))
    }

    pub fn record(&mut self, model: &str, field: &str, value: &Value) {
        self.used
            .entry(slot_key(model, field))
            .or_default()
            .insert(value.key());
    }

    /// Check a unique-together combination under its composite key.
    pub fn contains_combo(&self, model: &str, fields: &[String], values: &[&Value]) -> bool {
        self.used
            .get(&slot_key(model, &combo_field(fields)))
            .is_some_and(|entries| entries.contains(&combo_value(values)))
    }

    pub fn record_combo(&mut self, model: &str, fields: &[String], values: &[&Value]) {
        self.used
            .entry(slot_key(model, &combo_field(fields)))
            .or_default()
            .insert(combo_value(values));
    }

    /// Forget every recorded value.
    pub fn reset(&mut self) {
        self.used.clear();
    }

    /// Forget recorded values for one model.
    pub fn reset_model(&mut self, model: &str) {
        let prefix = format!("{model}\u{1f}");
        self.used.retain(|key, _| !key.starts_with(&prefix));
    }

    pub fn len(&self) -> usize {
        self.used.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.used.values().all(BTreeSet::is_empty)
    }
}

fn slot_key(model: &str, field: &str) -> String {
    format!("{model}\u{1f}{field}")
}

fn combo_field(fields: &[String]) -> String {
    fields.join("+")
}

fn combo_value(values: &[&Value]) -> String {
    let keys: Vec<String> = values.iter().map(|value| value.key()).collect();
    keys.join("\u{1f}")
}
