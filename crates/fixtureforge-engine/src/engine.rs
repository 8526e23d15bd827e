use std::collections::{BTreeMap, BTreeSet};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use regex::Regex;
use tracing::{debug, info, warn};

use fixtureforge_core::{
    FieldDescription, FieldKind, FieldValidator, Identity, Instance, ModelCatalog,
    ModelDescription, Relation, Value,
};

use crate::errors::{StoreError, SynthesisError};
use crate::generators;
use crate::ledger::UniquenessLedger;
use crate::options::FixtureOptions;
use crate::overrides::{OverrideValue, Overrides};
use crate::registry::PluginRegistry;
use crate::relations::{VisitationSet, join_sides};
use crate::resolver::{ResolutionPlan, resolve};
use crate::store::Storage;

/// Entry point for model-fixture synthesis.
///
/// The engine owns the plugin registry, the uniqueness ledger, the ignore
/// list and a seeded RNG; the schema catalog and the persistence collaborator
/// are injected. One engine is meant to live for a whole test process so the
/// ledger can guarantee distinct unique values across calls.
#[derive(Debug, Clone)]
pub struct FixtureEngine {
    catalog: ModelCatalog,
    registry: PluginRegistry,
    ledger: UniquenessLedger,
    ignored: BTreeSet<String>,
    options: FixtureOptions,
    rng: ChaCha8Rng,
}

impl FixtureEngine {
    pub fn new(catalog: ModelCatalog) -> Self {
        Self::with_options(catalog, FixtureOptions::default())
    }

    pub fn with_options(catalog: ModelCatalog, options: FixtureOptions) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(options.seed);
        Self {
            catalog,
            registry: PluginRegistry::new(),
            ledger: UniquenessLedger::new(),
            ignored: BTreeSet::new(),
            options,
            rng,
        }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn registry_mut(&mut self) -> &mut PluginRegistry {
        &mut self.registry
    }

    pub fn ledger(&self) -> &UniquenessLedger {
        &self.ledger
    }

    pub fn options(&self) -> &FixtureOptions {
        &self.options
    }

    /// Forget every recorded unique value, isolating a fresh test run.
    pub fn reset_ledger(&mut self) {
        self.ledger.reset();
    }

    /// Mark fields as permanently skipped regardless of nullability, for
    /// fields the caller wants the store's own defaulting to handle.
    pub fn ignore(&mut self, fields: &[&str]) {
        for field in fields {
            self.ignored.insert((*field).to_string());
        }
    }

    /// Synthesize and persist an instance of `model`.
    pub fn create(
        &mut self,
        store: &mut dyn Storage,
        model: &str,
        overrides: &Overrides,
    ) -> Result<Instance, SynthesisError> {
        let mut visiting = VisitationSet::new();
        self.synthesize(store, model, overrides, &mut visiting, true)
    }

    /// Synthesize without persisting the owner.
    ///
    /// Required related instances are still persisted so the unsaved owner
    /// holds valid references; to-many fields stay unlinked since links need
    /// an owner identity.
    pub fn build(
        &mut self,
        store: &mut dyn Storage,
        model: &str,
        overrides: &Overrides,
    ) -> Result<Instance, SynthesisError> {
        let mut visiting = VisitationSet::new();
        self.synthesize(store, model, overrides, &mut visiting, false)
    }

    /// Persist an independent duplicate of an existing instance.
    ///
    /// Every field except the primary identity becomes a verbatim override,
    /// caller overrides win, then the normal create pipeline runs.
    pub fn copy(
        &mut self,
        store: &mut dyn Storage,
        source: &Instance,
        overrides: &Overrides,
    ) -> Result<Instance, SynthesisError> {
        let fields: Vec<FieldDescription> = self
            .catalog
            .effective_fields(&source.model)?
            .into_iter()
            .cloned()
            .collect();

        let mut merged = Overrides::new();
        for field in &fields {
            if field.primary_key {
                continue;
            }
            if let Some(value) = source.get(&field.name) {
                merged.insert(field.name.clone(), OverrideValue::Literal(value.clone()));
            }
        }
        merged.extend_from(overrides);

        info!(model = %source.model, source = ?source.id, "copying fixture");
        self.create(store, &source.model, &merged)
    }

    fn synthesize(
        &mut self,
        store: &mut dyn Storage,
        model_name: &str,
        overrides: &Overrides,
        visiting: &mut VisitationSet,
        persist: bool,
    ) -> Result<Instance, SynthesisError> {
        let model = self.catalog.describe(model_name)?.clone();
        let fields: Vec<FieldDescription> = self
            .catalog
            .effective_fields(model_name)?
            .into_iter()
            .cloned()
            .collect();

        debug!(
            model = model_name,
            fields = fields.len(),
            persist,
            "synthesizing fixture"
        );

        let mut instance = Instance::new(model_name);
        let mut pending_unique: BTreeMap<String, Value> = BTreeMap::new();
        let mut generated: BTreeSet<String> = BTreeSet::new();
        let mut many_fields: Vec<FieldDescription> = Vec::new();

        for field in &fields {
            if field.kind.is_to_many() {
                many_fields.push(field.clone());
                continue;
            }

            match resolve(field, overrides, &self.ignored, &self.options) {
                ResolutionPlan::UseOverride(value) => match value {
                    OverrideValue::Literal(literal) => {
                        instance.set(&field.name, literal.clone());
                    }
                    OverrideValue::Nested(nested) => {
                        if !field.kind.is_relational() {
                            return Err(SynthesisError::Schema(
                                fixtureforge_core::Error::InvalidSchema(format!(
                                    "nested override on non-relational field '{}.{}'",
                                    model.name, field.name
                                )),
                            ));
                        }
                        if let Some(value) =
                            self.resolve_relation(store, &model, field, Some(nested), visiting)?
                        {
                            instance.set(&field.name, value);
                        }
                    }
                },
                ResolutionPlan::UseDefault(value) => {
                    instance.set(&field.name, value);
                }
                ResolutionPlan::Skip => {}
                ResolutionPlan::Generate => {
                    if field.kind.is_relational() {
                        if let Some(value) =
                            self.resolve_relation(store, &model, field, None, visiting)?
                        {
                            instance.set(&field.name, value);
                        }
                    } else {
                        let value = self.generate_value(store, &model, field, 0)?;
                        if field.unique {
                            pending_unique.insert(field.name.clone(), value.clone());
                        }
                        generated.insert(field.name.clone());
                        instance.set(&field.name, value);
                    }
                }
            }
        }

        self.satisfy_unique_together(
            store,
            &model,
            &fields,
            overrides,
            &generated,
            &mut instance,
            &mut pending_unique,
        )?;

        self.validate(&model, &fields, &instance)?;

        if persist {
            self.persist(store, &model, &fields, &mut instance, &mut pending_unique)?;

            for (field, value) in &pending_unique {
                self.ledger.record(&model.name, field, value);
            }
            for combo in &model.unique_together {
                if combo.iter().any(|member| overrides.contains(member)) {
                    continue;
                }
                let values: Vec<&Value> = combo
                    .iter()
                    .filter_map(|member| instance.get(member))
                    .collect();
                if values.len() == combo.len() {
                    self.ledger.record_combo(&model.name, combo, &values);
                }
            }

            for field in &many_fields {
                self.resolve_to_many(store, &model, field, overrides, visiting, &mut instance)?;
            }

            info!(model = model_name, id = ?instance.id, "fixture persisted");
        }

        Ok(instance)
    }

    /// Generate one value, retrying past ledger collisions within the budget.
    ///
    /// `salt` offsets the attempt counter so regeneration rounds explore a
    /// fresh candidate range.
    fn generate_value(
        &mut self,
        store: &mut dyn Storage,
        model: &ModelDescription,
        field: &FieldDescription,
        salt: u32,
    ) -> Result<Value, SynthesisError> {
        let plugin = self.registry.lookup(field);
        let budget = self.options.max_unique_attempts.max(1);

        for offset in 0..budget {
            let attempt = salt.saturating_add(offset);
            let value = match plugin {
                Some(generator) => generator(field, attempt)?,
                None if field.kind == FieldKind::File => {
                    let name = format!("{}_{}_{attempt}", model.table, field.name);
                    let path = store.materialize_file(&name).map_err(|source| {
                        SynthesisError::PersistenceFailed {
                            model: model.name.clone(),
                            source,
                        }
                    })?;
                    Value::Text(path)
                }
                None => generators::generate(field, attempt, &mut self.rng)?,
            };

            if !field.unique || !self.ledger.contains(&model.name, &field.name, &value) {
                return Ok(value);
            }
        }

        warn!(model = %model.name, field = %field.name, "uniqueness retry budget exhausted");
        Err(SynthesisError::ExhaustedUniquenessRetries {
            model: model.name.clone(),
            field: field.name.clone(),
            attempts: budget,
        })
    }

    fn resolve_relation(
        &mut self,
        store: &mut dyn Storage,
        owner: &ModelDescription,
        field: &FieldDescription,
        nested: Option<&Overrides>,
        visiting: &mut VisitationSet,
    ) -> Result<Option<Value>, SynthesisError> {
        let relation = relation_of(owner, field)?;

        if !visiting.enter(&owner.name, &field.name) {
            return if field.nullable {
                debug!(model = %owner.name, field = %field.name, "breaking nullable reference cycle");
                Ok(None)
            } else {
                Err(SynthesisError::CyclicDependency {
                    model: owner.name.clone(),
                    field: field.name.clone(),
                })
            };
        }

        let empty = Overrides::new();
        let nested = nested.unwrap_or(&empty);
        // the related instance persists even when the owner does not, so the
        // reference carries a real identity
        let result = self.synthesize(store, &relation.target, nested, visiting, true);
        visiting.leave(&owner.name, &field.name);

        let related = result?;
        let id = persisted_identity(&relation.target, &related)?;
        Ok(Some(Value::Ref(id)))
    }

    fn resolve_to_many(
        &mut self,
        store: &mut dyn Storage,
        owner: &ModelDescription,
        field: &FieldDescription,
        overrides: &Overrides,
        visiting: &mut VisitationSet,
        instance: &mut Instance,
    ) -> Result<(), SynthesisError> {
        let relation = relation_of(owner, field)?.clone();
        let owner_id = persisted_identity(&owner.name, instance)?;

        let nested = match resolve(field, overrides, &self.ignored, &self.options) {
            ResolutionPlan::Skip => return Ok(()),
            ResolutionPlan::UseOverride(OverrideValue::Literal(value)) => {
                return self.link_explicit(store, owner, field, instance, owner_id, value.clone());
            }
            ResolutionPlan::UseDefault(value) => {
                return self.link_explicit(store, owner, field, instance, owner_id, value);
            }
            ResolutionPlan::UseOverride(OverrideValue::Nested(nested)) => Some(nested),
            ResolutionPlan::Generate => None,
        };

        // a self-referential to-many would otherwise recurse per instance
        if !visiting.enter(&owner.name, &field.name) {
            debug!(model = %owner.name, field = %field.name, "skipping nested to-many recursion");
            return Ok(());
        }
        let result = self.create_links(store, owner, field, &relation, nested, owner_id, visiting);
        visiting.leave(&owner.name, &field.name);

        let ids = result?;
        instance.set(&field.name, Value::RefList(ids));
        Ok(())
    }

    fn create_links(
        &mut self,
        store: &mut dyn Storage,
        owner: &ModelDescription,
        field: &FieldDescription,
        relation: &Relation,
        nested: Option<&Overrides>,
        owner_id: Identity,
        visiting: &mut VisitationSet,
    ) -> Result<Vec<Identity>, SynthesisError> {
        let empty = Overrides::new();
        let nested = nested.unwrap_or(&empty);

        let mut ids = Vec::new();
        for _ in 0..self.options.many_count {
            let related = self.synthesize(store, &relation.target, nested, visiting, true)?;
            let related_id = persisted_identity(&relation.target, &related)?;

            if let Some(through) = &relation.through {
                let join_model = self.catalog.describe(through)?.clone();
                let (owner_side, related_side) =
                    join_sides(&join_model, &owner.name, &relation.target)
                        .map(|(a, b)| (a.name.clone(), b.name.clone()))
                        .ok_or_else(|| {
                            SynthesisError::Schema(fixtureforge_core::Error::InvalidSchema(
                                format!(
                                    "through model '{through}' does not reference both sides of '{}.{}'",
                                    owner.name, field.name
                                ),
                            ))
                        })?;
                let join_overrides = Overrides::new()
                    .set(owner_side, Value::Ref(owner_id))
                    .set(related_side, Value::Ref(related_id));
                self.synthesize(store, through, &join_overrides, visiting, true)?;
            }

            ids.push(related_id);
        }

        store
            .link(&owner.name, owner_id, &field.name, &ids)
            .map_err(|source| SynthesisError::PersistenceFailed {
                model: owner.name.clone(),
                source,
            })?;
        Ok(ids)
    }

    fn link_explicit(
        &mut self,
        store: &mut dyn Storage,
        owner: &ModelDescription,
        field: &FieldDescription,
        instance: &mut Instance,
        owner_id: Identity,
        value: Value,
    ) -> Result<(), SynthesisError> {
        let ids = match value {
            Value::RefList(ids) => ids,
            Value::Ref(id) => vec![id],
            Value::Null => return Ok(()),
            other => {
                return Err(SynthesisError::Schema(
                    fixtureforge_core::Error::InvalidSchema(format!(
                        "to-many override for '{}.{}' must be a reference list, got {other:?}",
                        owner.name, field.name
                    )),
                ));
            }
        };

        store
            .link(&owner.name, owner_id, &field.name, &ids)
            .map_err(|source| SynthesisError::PersistenceFailed {
                model: owner.name.clone(),
                source,
            })?;
        instance.set(&field.name, Value::RefList(ids));
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn satisfy_unique_together(
        &mut self,
        store: &mut dyn Storage,
        model: &ModelDescription,
        fields: &[FieldDescription],
        overrides: &Overrides,
        generated: &BTreeSet<String>,
        instance: &mut Instance,
        pending_unique: &mut BTreeMap<String, Value>,
    ) -> Result<(), SynthesisError> {
        let budget = self.options.max_unique_attempts.max(1);

        for combo in &model.unique_together {
            if combo.iter().any(|member| overrides.contains(member)) {
                continue; // overridden combos are the caller's responsibility
            }

            let mut round = 0;
            loop {
                let values: Vec<&Value> = combo
                    .iter()
                    .filter_map(|member| instance.get(member))
                    .collect();
                if values.len() < combo.len() {
                    break;
                }
                if !self.ledger.contains_combo(&model.name, combo, &values) {
                    break;
                }

                round += 1;
                let regen: Vec<FieldDescription> = fields
                    .iter()
                    .filter(|field| {
                        combo.contains(&field.name) && generated.contains(&field.name)
                    })
                    .cloned()
                    .collect();
                if round >= budget || regen.is_empty() {
                    return Err(SynthesisError::ExhaustedUniquenessRetries {
                        model: model.name.clone(),
                        field: combo.join("+"),
                        attempts: round,
                    });
                }

                for field in &regen {
                    let value = self.generate_value(store, model, field, round)?;
                    if field.unique {
                        pending_unique.insert(field.name.clone(), value.clone());
                    }
                    instance.set(&field.name, value);
                }
            }
        }

        Ok(())
    }

    fn validate(
        &self,
        model: &ModelDescription,
        fields: &[FieldDescription],
        instance: &Instance,
    ) -> Result<(), SynthesisError> {
        for field in fields {
            let Some(value) = instance.get(&field.name) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            for validator in &field.validators {
                match validator {
                    FieldValidator::Regex(pattern) => {
                        let regex = Regex::new(pattern).map_err(|err| {
                            SynthesisError::ValidationFailed {
                                model: model.name.clone(),
                                message: format!("invalid pattern on '{}': {err}", field.name),
                            }
                        })?;
                        let text = value.as_str().ok_or_else(|| {
                            SynthesisError::ValidationFailed {
                                model: model.name.clone(),
                                message: format!("'{}' is not a text value", field.name),
                            }
                        })?;
                        if !regex.is_match(text) {
                            return Err(SynthesisError::ValidationFailed {
                                model: model.name.clone(),
                                message: format!(
                                    "'{}' does not match pattern '{pattern}'",
                                    field.name
                                ),
                            });
                        }
                    }
                    FieldValidator::Func(check) => {
                        check(value).map_err(|message| SynthesisError::ValidationFailed {
                            model: model.name.clone(),
                            message,
                        })?;
                    }
                }
            }
        }

        if let Some(clean) = model.clean {
            clean(instance).map_err(|message| SynthesisError::ValidationFailed {
                model: model.name.clone(),
                message,
            })?;
        }

        Ok(())
    }

    /// Save the instance, regenerating generated unique fields on storage
    /// conflicts. Conflicts on overridden values and every other store error
    /// propagate uninterpreted.
    fn persist(
        &mut self,
        store: &mut dyn Storage,
        model: &ModelDescription,
        fields: &[FieldDescription],
        instance: &mut Instance,
        pending_unique: &mut BTreeMap<String, Value>,
    ) -> Result<(), SynthesisError> {
        let budget = self.options.max_save_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match store.save(instance) {
                Ok(id) => {
                    instance.id = Some(id);
                    return Ok(());
                }
                Err(StoreError::Conflict(reason)) if attempt < budget => {
                    let regen: Vec<FieldDescription> = fields
                        .iter()
                        .filter(|field| field.unique && pending_unique.contains_key(&field.name))
                        .cloned()
                        .collect();
                    if regen.is_empty() {
                        return Err(SynthesisError::PersistenceFailed {
                            model: model.name.clone(),
                            source: StoreError::Conflict(reason),
                        });
                    }

                    warn!(
                        model = %model.name,
                        attempt,
                        %reason,
                        "storage conflict, regenerating unique fields"
                    );
                    for field in &regen {
                        let salt = attempt.saturating_mul(self.options.max_unique_attempts);
                        let value = self.generate_value(store, model, field, salt)?;
                        instance.set(&field.name, value.clone());
                        pending_unique.insert(field.name.clone(), value);
                    }
                    self.validate(model, fields, instance)?;
                }
                Err(source) => {
                    return Err(SynthesisError::PersistenceFailed {
                        model: model.name.clone(),
                        source,
                    });
                }
            }
        }
    }
}

fn relation_of<'a>(
    owner: &ModelDescription,
    field: &'a FieldDescription,
) -> Result<&'a Relation, SynthesisError> {
    field.relation.as_ref().ok_or_else(|| {
        SynthesisError::Schema(fixtureforge_core::Error::InvalidSchema(format!(
            "relational field '{}.{}' missing relation metadata",
            owner.name, field.name
        )))
    })
}

fn persisted_identity(model: &str, instance: &Instance) -> Result<Identity, SynthesisError> {
    instance.id.ok_or_else(|| SynthesisError::PersistenceFailed {
        model: model.to_string(),
        source: StoreError::Rejected("instance has no persisted identity".to_string()),
    })
}
