use std::collections::BTreeSet;

use fixtureforge_core::{Cardinality, FieldDescription, ModelDescription};

/// Cycle-detection bookkeeping scoped to one top-level synthesis call.
///
/// Holds the (model, field) pairs currently being resolved; a pair seen
/// twice means the reference chain closed on itself.
#[derive(Debug, Default)]
pub struct VisitationSet {
    visiting: BTreeSet<(String, String)>,
}

impl VisitationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a pair as in-flight. Returns false if it already is.
    pub fn enter(&mut self, model: &str, field: &str) -> bool {
        self.visiting
            .insert((model.to_string(), field.to_string()))
    }

    pub fn leave(&mut self, model: &str, field: &str) {
        self.visiting
            .remove(&(model.to_string(), field.to_string()));
    }

    pub fn depth(&self) -> usize {
        self.visiting.len()
    }
}

/// Locate the join-model fields pointing at each side of a through relation.
///
/// Returns the field referencing the owner and the field referencing the
/// related model, as distinct fields even when both sides are the same model.
pub fn join_sides<'a>(
    join: &'a ModelDescription,
    owner: &str,
    related: &str,
) -> Option<(&'a FieldDescription, &'a FieldDescription)> {
    let to_one = |field: &&FieldDescription, target: &str| {
        field
            .relation
            .as_ref()
            .is_some_and(|relation| relation.cardinality != Cardinality::ToMany && relation.target == target)
    };

    let owner_field = join.fields.iter().find(|field| to_one(field, owner))?;
    let related_field = join
        .fields
        .iter()
        .find(|field| field.name != owner_field.name && to_one(field, related))?;
    Some((owner_field, related_field))
}
