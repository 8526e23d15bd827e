use crate::types::{
    Cardinality, Choice, CleanHook, DefaultValue, FieldKind, FieldValidator, Relation,
    ValueFactory,
};
use crate::value::Value;

/// Metadata for one field of a model.
#[derive(Debug, Clone)]
pub struct FieldDescription {
    pub name: String,
    pub kind: FieldKind,
    pub nullable: bool,
    pub unique: bool,
    pub primary_key: bool,
    /// Populated by the store on create/update; never assigned by the engine.
    pub auto_managed: bool,
    pub default: Option<DefaultValue>,
    pub max_length: Option<u32>,
    pub max_digits: Option<u8>,
    pub decimal_places: Option<u8>,
    pub choices: Vec<Choice>,
    pub validators: Vec<FieldValidator>,
    pub relation: Option<Relation>,
}

impl FieldDescription {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            unique: false,
            primary_key: false,
            auto_managed: false,
            default: None,
            max_length: None,
            max_digits: None,
            decimal_places: None,
            choices: Vec::new(),
            validators: Vec::new(),
            relation: None,
        }
    }

    /// To-one reference to `target`, non-nullable unless marked otherwise.
    pub fn foreign_key(name: impl Into<String>, target: impl Into<String>) -> Self {
        let mut field = Self::new(name, FieldKind::ForeignKey);
        field.relation = Some(Relation {
            target: target.into(),
            cardinality: Cardinality::ToOne,
            through: None,
        });
        field
    }

    pub fn one_to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        let mut field = Self::new(name, FieldKind::OneToOne);
        field.relation = Some(Relation {
            target: target.into(),
            cardinality: Cardinality::OneToOne,
            through: None,
        });
        field
    }

    pub fn many_to_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        let mut field = Self::new(name, FieldKind::ManyToMany);
        field.relation = Some(Relation {
            target: target.into(),
            cardinality: Cardinality::ToMany,
            through: None,
        });
        field
    }

    pub fn many_to_many_through(
        name: impl Into<String>,
        target: impl Into<String>,
        through: impl Into<String>,
    ) -> Self {
        let mut field = Self::many_to_many(name, target);
        if let Some(relation) = field.relation.as_mut() {
            relation.through = Some(through.into());
        }
        field
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn auto_managed(mut self) -> Self {
        self.auto_managed = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(DefaultValue::Literal(value));
        self
    }

    pub fn with_default_factory(mut self, factory: ValueFactory) -> Self {
        self.default = Some(DefaultValue::Factory(factory));
        self
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_decimal(mut self, max_digits: u8, decimal_places: u8) -> Self {
        self.max_digits = Some(max_digits);
        self.decimal_places = Some(decimal_places);
        self
    }

    pub fn with_choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = choices;
        self
    }

    pub fn with_validator(mut self, validator: FieldValidator) -> Self {
        self.validators.push(validator);
        self
    }
}

/// Schema of one model: ordered own fields plus table-level constraints.
///
/// Inherited fields live on the ancestor descriptions; the catalog resolves
/// the effective field sequence.
#[derive(Debug, Clone)]
pub struct ModelDescription {
    pub name: String,
    /// Identifier of the backing table/collection.
    pub table: String,
    /// Immediate parent model for inherited models.
    pub parent: Option<String>,
    pub fields: Vec<FieldDescription>,
    pub unique_together: Vec<Vec<String>>,
    pub clean: Option<CleanHook>,
}

impl ModelDescription {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let table = name.replace('.', "_").to_lowercase();
        Self {
            name,
            table,
            parent: None,
            fields: Vec::new(),
            unique_together: Vec::new(),
            clean: None,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_field(mut self, field: FieldDescription) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_unique_together(mut self, columns: &[&str]) -> Self {
        self.unique_together
            .push(columns.iter().map(|column| column.to_string()).collect());
        self
    }

    pub fn with_clean(mut self, hook: CleanHook) -> Self {
        self.clean = Some(hook);
        self
    }

    /// Look up an own (non-inherited) field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescription> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn primary_key_field(&self) -> Option<&FieldDescription> {
        self.fields.iter().find(|field| field.primary_key)
    }
}
