use std::collections::BTreeSet;

use fixtureforge_core::{FieldDescription, Value};

use crate::options::FixtureOptions;
use crate::overrides::{OverrideValue, Overrides};

/// Outcome of per-field constraint resolution.
#[derive(Debug)]
pub enum ResolutionPlan<'a> {
    /// Caller override, applied verbatim.
    UseOverride(&'a OverrideValue),
    /// Declared default; factories are already evaluated.
    UseDefault(Value),
    /// Leave the field unset.
    Skip,
    /// Delegate to a value generator or the relationship resolver.
    Generate,
}

/// Decide how a field gets its value. First match wins:
/// override, ignore list, store-assigned (primary key / auto-managed),
/// nullable under minimal mode, declared default, generate.
pub fn resolve<'a>(
    field: &FieldDescription,
    overrides: &'a Overrides,
    ignored: &BTreeSet<String>,
    options: &FixtureOptions,
) -> ResolutionPlan<'a> {
    if let Some(value) = overrides.get(&field.name) {
        return ResolutionPlan::UseOverride(value);
    }
    if ignored.contains(&field.name) {
        return ResolutionPlan::Skip;
    }
    if field.primary_key || field.auto_managed {
        return ResolutionPlan::Skip;
    }
    if field.nullable && !options.fill_nullable {
        return ResolutionPlan::Skip;
    }
    if let Some(default) = &field.default {
        return ResolutionPlan::UseDefault(default.resolve());
    }
    ResolutionPlan::Generate
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixtureforge_core::FieldKind;

    fn options() -> FixtureOptions {
        FixtureOptions::default()
    }

    #[test]
    fn override_wins_over_everything() {
        let field = FieldDescription::new("x", FieldKind::Integer)
            .auto_managed()
            .with_default(Value::Int(3));
        let overrides = Overrides::new().set("x", Value::Int(9));
        let ignored = BTreeSet::from(["x".to_string()]);

        assert!(matches!(
            resolve(&field, &overrides, &ignored, &options()),
            ResolutionPlan::UseOverride(OverrideValue::Literal(Value::Int(9)))
        ));
    }

    #[test]
    fn ignored_fields_skip_even_when_required() {
        let field = FieldDescription::new("x", FieldKind::Integer);
        let ignored = BTreeSet::from(["x".to_string()]);

        assert!(matches!(
            resolve(&field, &Overrides::new(), &ignored, &options()),
            ResolutionPlan::Skip
        ));
    }

    #[test]
    fn auto_managed_fields_are_left_to_the_store() {
        let field = FieldDescription::new("created", FieldKind::Date).auto_managed();
        assert!(matches!(
            resolve(&field, &Overrides::new(), &BTreeSet::new(), &options()),
            ResolutionPlan::Skip
        ));
    }

    #[test]
    fn nullable_skips_only_in_minimal_mode() {
        let field = FieldDescription::new("x", FieldKind::Integer).nullable();

        assert!(matches!(
            resolve(&field, &Overrides::new(), &BTreeSet::new(), &options()),
            ResolutionPlan::Skip
        ));

        let full = FixtureOptions {
            fill_nullable: true,
            ..FixtureOptions::default()
        };
        assert!(matches!(
            resolve(&field, &Overrides::new(), &BTreeSet::new(), &full),
            ResolutionPlan::Generate
        ));
    }

    #[test]
    fn defaults_beat_generation() {
        let field = FieldDescription::new("x", FieldKind::Integer).with_default(Value::Int(1));
        assert!(matches!(
            resolve(&field, &Overrides::new(), &BTreeSet::new(), &options()),
            ResolutionPlan::UseDefault(Value::Int(1))
        ));
    }
}
