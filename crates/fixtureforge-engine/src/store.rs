use std::collections::BTreeMap;

use chrono::Utc;

use fixtureforge_core::{FieldDescription, FieldKind, Identity, Instance, ModelCatalog, Value};

use crate::errors::StoreError;

/// Persistence collaborator contract.
///
/// `save` must be atomic per instance, assign an identity, and report
/// constraint violations as `StoreError::Conflict` so the engine can tell
/// retryable uniqueness collisions from fatal rejections.
pub trait Storage {
    fn save(&mut self, instance: &mut Instance) -> Result<Identity, StoreError>;

    /// Record to-many links from a persisted owner to related identities.
    fn link(
        &mut self,
        model: &str,
        owner: Identity,
        field: &str,
        targets: &[Identity],
    ) -> Result<(), StoreError>;

    /// Materialize an empty file-backed resource, returning its path.
    fn materialize_file(&mut self, name: &str) -> Result<String, StoreError>;
}

/// In-memory reference store.
///
/// Assigns auto-incrementing identities, enforces declared unique and
/// unique-together constraints, fills auto-managed temporal fields and named
/// primary keys when absent, and keeps link/file bookkeeping for assertions.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    catalog: ModelCatalog,
    rows: BTreeMap<String, BTreeMap<Identity, BTreeMap<String, Value>>>,
    links: BTreeMap<String, Vec<Identity>>,
    files: Vec<String>,
    next_id: u64,
}

impl InMemoryStore {
    pub fn new(catalog: ModelCatalog) -> Self {
        Self {
            catalog,
            rows: BTreeMap::new(),
            links: BTreeMap::new(),
            files: Vec::new(),
            next_id: 0,
        }
    }

    pub fn count(&self, model: &str) -> usize {
        self.rows.get(model).map_or(0, BTreeMap::len)
    }

    pub fn row(&self, model: &str, id: Identity) -> Option<&BTreeMap<String, Value>> {
        self.rows.get(model)?.get(&id)
    }

    pub fn linked(&self, model: &str, owner: Identity, field: &str) -> &[Identity] {
        self.links
            .get(&link_key(model, owner, field))
            .map_or(&[], Vec::as_slice)
    }

    pub fn files(&self) -> &[String] {
        self.files.as_slice()
    }

    fn check_not_null(
        &self,
        instance: &Instance,
        fields: &[&FieldDescription],
    ) -> Result<(), StoreError> {
        for field in fields {
            if field.kind.is_to_many() || field.primary_key || field.auto_managed {
                continue;
            }
            if field.nullable {
                continue;
            }
            let missing = instance
                .get(&field.name)
                .is_none_or(Value::is_null);
            if missing {
                return Err(StoreError::Rejected(format!(
                    "null value in non-nullable column '{}.{}'",
                    instance.model, field.name
                )));
            }
        }
        Ok(())
    }

    fn check_unique(
        &self,
        instance: &Instance,
        fields: &[&FieldDescription],
    ) -> Result<(), StoreError> {
        let existing = self.rows.get(&instance.model);

        for field in fields {
            if !field.unique {
                continue;
            }
            let Some(value) = instance.get(&field.name) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let key = value.key();
            let clash = existing.is_some_and(|rows| {
                rows.values()
                    .any(|row| row.get(&field.name).is_some_and(|other| other.key() == key))
            });
            if clash {
                return Err(StoreError::Conflict(format!(
                    "duplicate value for unique column '{}.{}'",
                    instance.model, field.name
                )));
            }
        }

        let model = self
            .catalog
            .describe(&instance.model)
            .map_err(|_| StoreError::UnknownModel(instance.model.clone()))?;
        for combo in &model.unique_together {
            let values: Vec<Option<&Value>> = combo
                .iter()
                .map(|member| instance.get(member).filter(|value| !value.is_null()))
                .collect();
            if values.iter().any(Option::is_none) {
                continue;
            }
            let clash = existing.is_some_and(|rows| {
                rows.values().any(|row| {
                    combo.iter().zip(&values).all(|(member, value)| {
                        row.get(member)
                            .zip(*value)
                            .is_some_and(|(stored, fresh)| stored.key() == fresh.key())
                    })
                })
            });
            if clash {
                return Err(StoreError::Conflict(format!(
                    "duplicate value for unique-together ({}) on '{}'",
                    combo.join(", "),
                    instance.model
                )));
            }
        }

        Ok(())
    }

    fn fill_store_managed(&self, instance: &mut Instance, fields: &[&FieldDescription], id: Identity) {
        for field in fields {
            if instance.get(&field.name).is_some() {
                continue;
            }
            if field.primary_key {
                instance.set(&field.name, Value::Int(id.0 as i64));
                continue;
            }
            if field.auto_managed {
                let now = Utc::now().naive_utc();
                let value = match field.kind {
                    FieldKind::Date => Some(Value::Date(now.date())),
                    FieldKind::DateTime => Some(Value::DateTime(now)),
                    FieldKind::Time => Some(Value::Time(now.time())),
                    _ => None,
                };
                if let Some(value) = value {
                    instance.set(&field.name, value);
                }
            }
        }
    }
}

impl Storage for InMemoryStore {
    fn save(&mut self, instance: &mut Instance) -> Result<Identity, StoreError> {
        let fields: Vec<FieldDescription> = self
            .catalog
            .effective_fields(&instance.model)
            .map_err(|_| StoreError::UnknownModel(instance.model.clone()))?
            .into_iter()
            .cloned()
            .collect();
        let field_refs: Vec<&FieldDescription> = fields.iter().collect();

        self.check_not_null(instance, &field_refs)?;
        self.check_unique(instance, &field_refs)?;

        self.next_id += 1;
        let id = Identity(self.next_id);
        self.fill_store_managed(instance, &field_refs, id);
        instance.id = Some(id);

        self.rows
            .entry(instance.model.clone())
            .or_default()
            .insert(id, instance.values.clone());
        Ok(id)
    }

    fn link(
        &mut self,
        model: &str,
        owner: Identity,
        field: &str,
        targets: &[Identity],
    ) -> Result<(), StoreError> {
        self.links
            .entry(link_key(model, owner, field))
            .or_default()
            .extend_from_slice(targets);
        Ok(())
    }

    fn materialize_file(&mut self, name: &str) -> Result<String, StoreError> {
        let path = format!("media/{name}");
        self.files.push(path.clone());
        Ok(path)
    }
}

fn link_key(model: &str, owner: Identity, field: &str) -> String {
    format!("{model}\u{1f}{owner}\u{1f}{field}")
}
