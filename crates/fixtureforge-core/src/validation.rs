use std::collections::BTreeSet;

use crate::catalog::ModelCatalog;
use crate::error::{Error, Result};
use crate::types::{Cardinality, Choice, FieldKind};

/// Validate internal consistency of a model catalog.
///
/// This checks:
/// - parent chains resolve without cycles
/// - duplicate field names across inheritance levels
/// - relational fields carry relation metadata and point at known models
/// - through models exist and reference both sides of the relation
/// - unique-together members exist
/// - declared choice sets flatten to at least one leaf
/// - decimal fields have room for their declared places
pub fn validate_catalog(catalog: &ModelCatalog) -> Result<()> {
    for model in catalog.models() {
        let fields = catalog.effective_fields(&model.name)?;

        let mut seen = BTreeSet::new();
        for field in &fields {
            if !seen.insert(field.name.clone()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate field name: {}.{}",
                    model.name, field.name
                )));
            }
        }

        for field in &fields {
            match (&field.relation, field.kind.is_relational()) {
                (None, true) => {
                    return Err(Error::InvalidSchema(format!(
                        "relational field missing relation metadata: {}.{}",
                        model.name, field.name
                    )));
                }
                (Some(_), false) => {
                    return Err(Error::InvalidSchema(format!(
                        "non-relational field carries relation metadata: {}.{}",
                        model.name, field.name
                    )));
                }
                _ => {}
            }

            if let Some(relation) = &field.relation {
                if catalog.describe(&relation.target).is_err() {
                    return Err(Error::InvalidSchema(format!(
                        "relation target not found: {}.{} -> {}",
                        model.name, field.name, relation.target
                    )));
                }

                if field.kind.is_to_many() && relation.cardinality != Cardinality::ToMany {
                    return Err(Error::InvalidSchema(format!(
                        "many-to-many field with non to-many cardinality: {}.{}",
                        model.name, field.name
                    )));
                }

                if let Some(through) = &relation.through {
                    validate_through(catalog, &model.name, &field.name, through, &relation.target)?;
                }
            }

            if !field.choices.is_empty() && Choice::flatten(&field.choices).is_empty() {
                return Err(Error::InvalidSchema(format!(
                    "choice set has no leaf values: {}.{}",
                    model.name, field.name
                )));
            }

            if field.kind == FieldKind::Decimal
                && let (Some(digits), Some(places)) = (field.max_digits, field.decimal_places)
                && places > digits
            {
                return Err(Error::InvalidSchema(format!(
                    "decimal places exceed max digits: {}.{}",
                    model.name, field.name
                )));
            }
        }

        let field_names: BTreeSet<&str> = fields.iter().map(|field| field.name.as_str()).collect();
        for combo in &model.unique_together {
            for member in combo {
                if !field_names.contains(member.as_str()) {
                    return Err(Error::InvalidSchema(format!(
                        "unique-together member not found: {}.{}",
                        model.name, member
                    )));
                }
            }
        }
    }

    Ok(())
}

fn validate_through(
    catalog: &ModelCatalog,
    owner: &str,
    field: &str,
    through: &str,
    target: &str,
) -> Result<()> {
    let join = catalog.describe(through).map_err(|_| {
        Error::InvalidSchema(format!(
            "through model not found: {owner}.{field} -> {through}"
        ))
    })?;

    let mut sides = BTreeSet::new();
    for join_field in &join.fields {
        if let Some(relation) = &join_field.relation
            && relation.cardinality != Cardinality::ToMany
        {
            sides.insert(relation.target.as_str());
        }
    }

    if !sides.contains(owner) || !sides.contains(target) {
        return Err(Error::InvalidSchema(format!(
            "through model '{through}' must reference both '{owner}' and '{target}'"
        )));
    }

    Ok(())
}
