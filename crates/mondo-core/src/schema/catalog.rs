use super::{Model, ModelId};
use crate::{Error, Result};
use std::collections::HashMap;

/// The per-session metadata catalog: every registered model, addressable by
/// name and by id.
///
/// Registration stores plain data; [`Catalog::link`] resolves relationship
/// targets and pairs each inverse side with its owning companion. Linking
/// runs lazily before the first operation that traverses relationships and
/// is re-run after further registrations.
#[derive(Debug, Default)]
pub struct Catalog {
    models: Vec<Model>,
    by_name: HashMap<String, ModelId>,
    linked: bool,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model under its name. Re-registering a name is an error.
    pub fn register(&mut self, mut model: Model) -> Result<ModelId> {
        if self.by_name.contains_key(&model.name) {
            return Err(Error::configuration(format!(
                "type `{}` is already registered",
                model.name
            )));
        }
        let id = ModelId(self.models.len());
        model.id = id;
        for (index, field) in model.fields.iter_mut().enumerate() {
            field.id = super::FieldId { model: id, index };
        }
        self.by_name.insert(model.name.clone(), id);
        self.models.push(model);
        self.linked = false;
        Ok(id)
    }

    pub fn model(&self, id: ModelId) -> &Model {
        &self.models[id.0]
    }

    pub fn lookup(&self, name: &str) -> Option<ModelId> {
        self.by_name.get(name).copied()
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn is_linked(&self) -> bool {
        self.linked
    }

    /// Resolves relationship targets and verifies that every inverse side has
    /// a compatible owning companion. Idempotent.
    pub fn link(&mut self) -> Result<()> {
        if self.linked {
            return Ok(());
        }

        // Pass 1: resolve reference targets by registered name.
        for m in 0..self.models.len() {
            for f in 0..self.models[m].fields.len() {
                let target_name = match self.models[m].fields[f].ty.as_reference() {
                    Some(reference) => reference.target_name.clone(),
                    None => continue,
                };
                let Some(&target) = self.by_name.get(&target_name) else {
                    return Err(Error::configuration(format!(
                        "`{}` references unregistered type `{target_name}`",
                        self.field_path(m, f)
                    )));
                };
                if let Some(reference) = self.models[m].fields[f].ty.as_reference_mut() {
                    reference.target = Some(target);
                }
            }
        }

        // Pass 2: pair each inverse side with its owning companion.
        for m in 0..self.models.len() {
            for f in 0..self.models[m].fields.len() {
                let (target, mapped_by) = match self.models[m].fields[f].ty.as_reference() {
                    Some(reference) => match &reference.mapped_by {
                        Some(mapped_by) => (reference.target(), mapped_by.clone()),
                        None => continue,
                    },
                    None => continue,
                };
                let pair = {
                    let path = self.field_path(m, f);
                    let target_model = &self.models[target.0];
                    let Some(owning) = target_model.field_by_name(&mapped_by) else {
                        return Err(Error::configuration(format!(
                            "`{path}` is mapped by `{mapped_by}`, but `{}` has no such field",
                            target_model.name
                        )));
                    };
                    let Some(owning_reference) = owning.ty.as_reference() else {
                        return Err(Error::configuration(format!(
                            "`{path}` is mapped by `{}.{mapped_by}`, which is not a reference field",
                            target_model.name
                        )));
                    };
                    if !owning_reference.is_owning() {
                        return Err(Error::configuration(format!(
                            "`{path}` is mapped by `{}.{mapped_by}`, which is itself an inverse side",
                            target_model.name
                        )));
                    }
                    if owning_reference.target != Some(self.models[m].id) {
                        return Err(Error::configuration(format!(
                            "`{path}` is mapped by `{}.{mapped_by}`, which does not reference `{}`",
                            target_model.name, self.models[m].name
                        )));
                    }
                    owning.id
                };
                if let Some(reference) = self.models[m].fields[f].ty.as_reference_mut() {
                    reference.pair = Some(pair);
                }
            }
        }

        self.linked = true;
        Ok(())
    }

    fn field_path(&self, model: usize, field: usize) -> String {
        format!(
            "{}.{}",
            self.models[model].name, self.models[model].fields[field].name.app_name
        )
    }
}
