//! Turning stored documents back into entity graphs.
//!
//! Hydration is strictly eager: owning references are resolved by identifier
//! lookup, inverse sides by querying the owning collection. An entity is
//! registered in the identity map and marked in-flight before any reference
//! is resolved, which is what terminates reference cycles.

use crate::entity::{AnyEntity, FieldValue};
use crate::manager::DocumentManager;
use mondo_core::doc::{Document, ObjectId, Value};
use mondo_core::schema::{FieldTy, ModelId};
use mondo_core::{Error, Result};

/// Everything needed to resolve one relationship field, detached from the
/// catalog so resolution can recurse through the manager.
struct RelationPlan {
    index: usize,
    many: bool,
    target: ModelId,

    /// Storage key of this field (owning side reads identifiers from it).
    storage: String,

    /// For an inverse side, the storage key of the owning field on the
    /// target; the resolution filter is `{key: this id}`, which under
    /// MongoDB semantics matches both a plain identifier and a list
    /// containing it.
    inverse_key: Option<String>,
}

impl DocumentManager {
    /// Hydrates a fetched document into an entity.
    ///
    /// When the identifier is already managed, the session copy stays
    /// authoritative for scalar fields, but relationship fields are
    /// re-resolved from the fetched document: the in-memory graph a caller
    /// persisted never carries inverse sides, so they are filled in from the
    /// store on every load. An entity whose relationships are already being
    /// resolved higher up the call stack is returned as-is.
    pub(crate) fn hydrate(&mut self, model: ModelId, doc: Document) -> Result<AnyEntity> {
        let id = document_id(&doc)?;
        let key = (model, id);

        if let Some(existing) = self.identity.get(&key) {
            if self.hydrating.contains(&key) {
                return Ok(existing);
            }
            self.identity.set_origin(key, &existing, doc.clone());
            self.hydrating.insert(key);
            let populated = self.populate_relations(model, &existing, &doc, id);
            self.hydrating.remove(&key);
            populated?;
            return Ok(existing);
        }

        let ops = self.registry.ops(model);
        let entity = (ops.new)();
        (ops.set_id)(&entity, id)?;

        // Scalars first; a key absent from the document leaves the field at
        // its default value.
        let scalars: Vec<(usize, String)> = self
            .registry
            .catalog
            .model(model)
            .fields
            .iter()
            .enumerate()
            .filter(|(_, field)| matches!(field.ty, FieldTy::Scalar))
            .map(|(index, field)| (index, field.name.storage_name().to_string()))
            .collect();
        for (index, storage) in scalars {
            if let Some(value) = doc.get(&storage) {
                (ops.set)(&entity, index, FieldValue::Scalar(value.clone()))?;
            }
        }

        // Register before resolving references so cyclic graphs terminate.
        self.identity
            .insert_hydrated(key, entity.clone(), doc.clone());
        self.hydrating.insert(key);
        let populated = self.populate_relations(model, &entity, &doc, id);
        self.hydrating.remove(&key);
        populated?;

        Ok(entity)
    }

    fn populate_relations(
        &mut self,
        model: ModelId,
        entity: &AnyEntity,
        doc: &Document,
        id: ObjectId,
    ) -> Result<()> {
        let ops = self.registry.ops(model);
        for plan in self.relation_plan(model) {
            let value = match &plan.inverse_key {
                None => self.resolve_owning(&plan, doc)?,
                Some(key) => self.resolve_inverse(&plan, key, id)?,
            };
            (ops.set)(entity, plan.index, value)?;
        }
        Ok(())
    }

    fn relation_plan(&self, model: ModelId) -> Vec<RelationPlan> {
        let schema = self.registry.catalog.model(model);
        let mut plans = Vec::new();
        for (index, field) in schema.fields.iter().enumerate() {
            let Some(reference) = field.reference() else {
                continue;
            };
            let target = reference.target();
            let inverse_key = if reference.is_owning() {
                None
            } else {
                let pair = reference.pair();
                let owning = &self.registry.catalog.model(target).fields[pair.index];
                Some(owning.name.storage_name().to_string())
            };
            plans.push(RelationPlan {
                index,
                many: field.ty.is_reference_many(),
                target,
                storage: field.name.storage_name().to_string(),
                inverse_key,
            });
        }
        plans
    }

    fn resolve_owning(&mut self, plan: &RelationPlan, doc: &Document) -> Result<FieldValue> {
        if plan.many {
            let ids: Vec<ObjectId> = match doc.get(&plan.storage) {
                Some(Value::Array(items)) => {
                    items.iter().filter_map(Value::as_object_id).collect()
                }
                _ => Vec::new(),
            };
            let mut entities = Vec::with_capacity(ids.len());
            for id in ids {
                // entries pointing at deleted documents are dropped; stored
                // order is kept for the rest
                if let Some(entity) = self.resolve_reference(plan.target, id)? {
                    entities.push(entity);
                }
            }
            Ok(FieldValue::Many(entities))
        } else {
            let resolved = match doc.get(&plan.storage).and_then(Value::as_object_id) {
                Some(id) => self.resolve_reference(plan.target, id)?,
                None => None,
            };
            Ok(FieldValue::One(resolved))
        }
    }

    fn resolve_inverse(
        &mut self,
        plan: &RelationPlan,
        owning_key: &str,
        id: ObjectId,
    ) -> Result<FieldValue> {
        let mut filter = Document::new();
        filter.insert(owning_key, Value::ObjectId(id));
        let docs = self.query_many(plan.target, &filter)?;
        let mut entities = Vec::with_capacity(docs.len());
        for doc in docs {
            entities.push(self.hydrate(plan.target, doc)?);
        }
        if plan.many {
            Ok(FieldValue::Many(entities))
        } else {
            Ok(FieldValue::One(entities.into_iter().next()))
        }
    }

    /// Resolves one referenced identifier through the identity map or a
    /// lookup on the target collection. A missing document is non-fatal: the
    /// reference resolves to nothing and hydration of the parent continues.
    fn resolve_reference(
        &mut self,
        target: ModelId,
        id: ObjectId,
    ) -> Result<Option<AnyEntity>> {
        if let Some(existing) = self.identity.get(&(target, id)) {
            return Ok(Some(existing));
        }
        let collection = self.collection_name(target);
        let mut filter = Document::new();
        filter.insert("_id", Value::ObjectId(id));
        let found = self.db.collection(&collection).find_one(&filter)?;
        match found {
            Some(doc) => Ok(Some(self.hydrate(target, doc)?)),
            None => Ok(None),
        }
    }
}

fn document_id(doc: &Document) -> Result<ObjectId> {
    doc.get("_id")
        .and_then(Value::as_object_id)
        .ok_or_else(|| Error::integrity("stored document is missing a valid `_id`"))
}
