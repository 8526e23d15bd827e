use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::schema::{FieldDescription, ModelDescription};

/// Registry of model descriptions with inheritance resolution.
///
/// This is the engine's schema-introspection collaborator: it returns fields
/// in stable declared order and resolves ancestor chains as an explicit
/// root-first list.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: BTreeMap<String, ModelDescription>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, model: ModelDescription) -> Result<()> {
        if self.models.contains_key(&model.name) {
            return Err(Error::InvalidSchema(format!(
                "duplicate model name: {}",
                model.name
            )));
        }
        self.models.insert(model.name.clone(), model);
        Ok(())
    }

    pub fn describe(&self, model: &str) -> Result<&ModelDescription> {
        self.models
            .get(model)
            .ok_or_else(|| Error::UnknownModel(model.to_string()))
    }

    /// Ancestor chain for a model, root-first, ending with the model itself.
    pub fn ancestry(&self, model: &str) -> Result<Vec<&ModelDescription>> {
        let mut chain = Vec::new();
        let mut current = self.describe(model)?;
        chain.push(current);

        while let Some(parent) = current.parent.as_deref() {
            if chain.len() > self.models.len() {
                return Err(Error::InvalidSchema(format!(
                    "inheritance cycle involving model '{model}'"
                )));
            }
            current = self.describe(parent)?;
            chain.push(current);
        }

        chain.reverse();
        Ok(chain)
    }

    /// Effective field sequence: ancestor fields before own fields, declared
    /// order preserved at each level.
    pub fn effective_fields(&self, model: &str) -> Result<Vec<&FieldDescription>> {
        let mut fields = Vec::new();
        for ancestor in self.ancestry(model)? {
            fields.extend(ancestor.fields.iter());
        }
        Ok(fields)
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelDescription> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
