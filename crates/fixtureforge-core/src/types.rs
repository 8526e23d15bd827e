use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::value::{Instance, Value};

/// Built-in field categories plus the open custom tag.
///
/// Relational kinds are resolved by the relationship resolver; `Custom`
/// kinds dispatch through the plugin registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Integer,
    SmallInteger,
    BigInteger,
    PositiveInteger,
    PositiveSmallInteger,
    Float,
    Decimal,
    Text,
    Slug,
    Boolean,
    Date,
    Time,
    DateTime,
    Uuid,
    Binary,
    FilePath,
    File,
    Email,
    Url,
    IpAddress,
    Json,
    ForeignKey,
    OneToOne,
    ManyToMany,
    Custom(String),
}

impl FieldKind {
    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            FieldKind::ForeignKey | FieldKind::OneToOne | FieldKind::ManyToMany
        )
    }

    pub fn is_to_many(&self) -> bool {
        matches!(self, FieldKind::ManyToMany)
    }
}

/// Cardinality of a relation as seen from the owning model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    ToOne,
    OneToOne,
    ToMany,
}

/// Relational metadata for foreign-key, one-to-one and many-to-many fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Relation {
    /// Referenced model name; may equal the owning model (self-referential).
    pub target: String,
    pub cardinality: Cardinality,
    /// Explicit join model mediating a many-to-many relation.
    pub through: Option<String>,
}

/// Allowed literal values for a field, possibly grouped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    Leaf(Value),
    Group { label: String, choices: Vec<Choice> },
}

impl Choice {
    /// Flatten nested groups into leaf values, preserving declared order.
    pub fn flatten(choices: &[Choice]) -> Vec<&Value> {
        let mut leaves = Vec::new();
        for choice in choices {
            match choice {
                Choice::Leaf(value) => leaves.push(value),
                Choice::Group { choices, .. } => leaves.extend(Self::flatten(choices)),
            }
        }
        leaves
    }
}

/// Factory evaluated each time a default is requested.
pub type ValueFactory = fn() -> Value;

/// Declared default for a field: a literal or a factory.
#[derive(Debug, Clone)]
pub enum DefaultValue {
    Literal(Value),
    Factory(ValueFactory),
}

impl DefaultValue {
    pub fn resolve(&self) -> Value {
        match self {
            DefaultValue::Literal(value) => value.clone(),
            DefaultValue::Factory(factory) => factory(),
        }
    }
}

/// Per-field validator, checked before the model-level hook.
#[derive(Debug, Clone)]
pub enum FieldValidator {
    /// Text values must match the pattern.
    Regex(String),
    Func(fn(&Value) -> Result<(), String>),
}

/// Model-level validation hook, invoked before persistence.
pub type CleanHook = fn(&Instance) -> Result<(), String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_preserves_declared_order_across_groups() {
        let choices = vec![
            Choice::Group {
                label: "group1".to_string(),
                choices: vec![
                    Choice::Leaf(Value::Text("a".to_string())),
                    Choice::Leaf(Value::Text("b".to_string())),
                ],
            },
            Choice::Group {
                label: "group2".to_string(),
                choices: vec![Choice::Leaf(Value::Text("c".to_string()))],
            },
        ];

        let leaves = Choice::flatten(&choices);
        let texts: Vec<&str> = leaves.iter().filter_map(|value| value.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn factory_defaults_resolve_on_each_call() {
        fn three() -> Value {
            Value::Int(3)
        }

        let default = DefaultValue::Factory(three);
        assert_eq!(default.resolve(), Value::Int(3));
        assert_eq!(
            DefaultValue::Literal(Value::Bool(false)).resolve(),
            Value::Bool(false)
        );
    }
}
