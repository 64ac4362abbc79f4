use crate::entity::{AnyEntity, Entity, FieldValue, Ref};
use crate::identity::{EntityKey, IdentityMap};
use crate::registry::{Registration, Registry};
use crate::unit_of_work::{staged_order, UnitOfWork};
use mondo_core::doc::{Document, ObjectId, Value};
use mondo_core::driver::Driver;
use mondo_core::schema::{FieldTy, ModelId};
use mondo_core::{Error, Result};

use std::collections::{HashMap, HashSet};
use std::fmt;

/// A unit-of-work session over a document store.
///
/// The manager tracks a per-session identity map of live entities, stages
/// persist and remove intents, and commits them on [`flush`](Self::flush) in
/// dependency order. A session is single-owner: every operation takes
/// `&mut self`, and the entity graph uses non-`Send` shared handles. Run
/// concurrent work through separate sessions.
pub struct DocumentManager {
    pub(crate) db: Box<dyn Driver>,
    pub(crate) registry: Registry,
    pub(crate) identity: IdentityMap,
    pub(crate) unit: UnitOfWork,

    /// Keys whose relationships are being resolved somewhere up the call
    /// stack; re-entering one returns the managed entity as-is.
    pub(crate) hydrating: HashSet<EntityKey>,
}

impl DocumentManager {
    pub fn new(driver: impl Driver) -> Self {
        Self {
            db: Box::new(driver),
            registry: Registry::default(),
            identity: IdentityMap::default(),
            unit: UnitOfWork::default(),
            hydrating: HashSet::new(),
        }
    }

    /// Registers `T` under `name`, which is also the collection name.
    pub fn register<T: Entity + Default>(&mut self, name: &str) -> Result<()> {
        self.registry.register::<T>(name)
    }

    /// Registers each entry in order. On failure the entries registered so
    /// far stay registered.
    pub fn register_many(&mut self, registrations: &[Registration]) -> Result<()> {
        for registration in registrations {
            registration.apply(self)?;
        }
        Ok(())
    }

    /// Marks an entity for upsert.
    ///
    /// A not-yet-persisted entity is assigned an identifier immediately, so
    /// the in-memory graph can reference it before the flush. Owning
    /// relationships whose cascade includes `persist` are walked recursively;
    /// re-entering an entity already visited is a no-op, which terminates
    /// cycles.
    ///
    /// Persisting a managed entity stages an update only when its serialized
    /// form differs from the origin snapshot. Mutating a managed entity
    /// without calling `persist` again never produces a write.
    pub fn persist<T: Entity>(&mut self, entity: &Ref<T>) -> Result<()> {
        let model = self.registry.model_of::<T>()?;
        self.ready()?;
        let mut visited = HashSet::new();
        self.persist_entity(model, AnyEntity::from_ref(entity), &mut visited)
    }

    /// Marks an entity for deletion.
    ///
    /// Owning relationships whose cascade includes `remove` propagate the
    /// removal; no reference counting is performed, so a cascade-removed
    /// child is deleted even if other documents still reference it. Removing
    /// an entity scheduled for insert cancels the insert instead. Repeated
    /// removes are idempotent.
    pub fn remove<T: Entity>(&mut self, entity: &Ref<T>) -> Result<()> {
        let model = self.registry.model_of::<T>()?;
        self.ready()?;
        let mut visited = HashSet::new();
        self.remove_entity(model, AnyEntity::from_ref(entity), &mut visited)
    }

    /// Commits staged changes: inserts in dependency order (referenced
    /// entities first), then updates, then removes in reverse dependency
    /// order.
    ///
    /// The first driver error aborts the flush and is returned; writes
    /// already applied are not rolled back, and everything not yet written
    /// stays staged for a later flush.
    pub fn flush(&mut self) -> Result<()> {
        if self.unit.is_empty() {
            return Ok(());
        }
        self.ready()?;

        // Inserts: referenced entities first, so owning identifier fields
        // always point at stored documents.
        let mut deps: HashMap<EntityKey, Vec<EntityKey>> = HashMap::new();
        for (key, entity) in &self.unit.inserts {
            deps.insert(*key, self.owning_children(key.0, entity)?);
        }
        let order = staged_order(&self.unit.inserts, |key| {
            deps.get(key).cloned().unwrap_or_default()
        });
        for key in order {
            let Some(entity) = self.unit.inserts.get(&key).cloned() else {
                continue;
            };
            let doc = self.serialize(key.0, &entity)?;
            let collection = self.collection_name(key.0);
            self.db.collection(&collection).insert(doc.clone())?;
            self.unit.inserts.shift_remove(&key);
            self.identity.set_origin(key, &entity, doc);
        }

        // Updates, in staging order.
        let staged: Vec<EntityKey> = self.unit.updates.keys().copied().collect();
        for key in staged {
            let Some(entity) = self.unit.updates.get(&key).cloned() else {
                continue;
            };
            let doc = self.serialize(key.0, &entity)?;
            let collection = self.collection_name(key.0);
            self.db.collection(&collection).update_by_id(&key.1, doc.clone())?;
            self.unit.updates.shift_remove(&key);
            self.identity.set_origin(key, &entity, doc);
        }

        // Removes: owning entities first, their cascade-removed children
        // after.
        let mut owners: HashMap<EntityKey, Vec<EntityKey>> = HashMap::new();
        for (key, entity) in &self.unit.removes {
            for child in self.owning_children(key.0, entity)? {
                if self.unit.removes.contains_key(&child) {
                    owners.entry(child).or_default().push(*key);
                }
            }
        }
        let order = staged_order(&self.unit.removes, |key| {
            owners.get(key).cloned().unwrap_or_default()
        });
        for key in order {
            let collection = self.collection_name(key.0);
            self.db.collection(&collection).remove_by_id(&key.1)?;
            self.unit.removes.shift_remove(&key);
            self.identity.remove(&key);
        }

        Ok(())
    }

    /// Looks up a document by identifier.
    ///
    /// Returns the not-found sentinel (see [`Error::is_not_found`]) when no
    /// document exists.
    pub fn find_id<T: Entity>(&mut self, id: ObjectId) -> Result<Ref<T>> {
        let model = self.registry.model_of::<T>()?;
        self.ready()?;
        let collection = self.collection_name(model);
        let mut filter = Document::new();
        filter.insert("_id", Value::ObjectId(id));
        let Some(doc) = self.db.collection(&collection).find_one(&filter)? else {
            return Err(Error::not_found(format!("collection={collection} id={id}")));
        };
        self.hydrate(model, doc)?.downcast::<T>()
    }

    /// Returns the first document matching the filter. The filter is passed
    /// through to the driver unchanged.
    pub fn find_one<T: Entity>(&mut self, filter: Document) -> Result<Ref<T>> {
        let model = self.registry.model_of::<T>()?;
        self.ready()?;
        let collection = self.collection_name(model);
        let Some(doc) = self.db.collection(&collection).find_one(&filter)? else {
            return Err(Error::not_found(format!(
                "collection={collection} has no document matching the filter"
            )));
        };
        self.hydrate(model, doc)?.downcast::<T>()
    }

    /// Returns every document in the entity's collection.
    pub fn find_all<T: Entity>(&mut self) -> Result<Vec<Ref<T>>> {
        self.find_by::<T>(Document::new())
    }

    /// Returns all documents matching the filter, passed through to the
    /// driver unchanged.
    pub fn find_by<T: Entity>(&mut self, filter: Document) -> Result<Vec<Ref<T>>> {
        let model = self.registry.model_of::<T>()?;
        self.ready()?;
        let docs = self.query_many(model, &filter)?;
        let mut entities = Vec::with_capacity(docs.len());
        for doc in docs {
            entities.push(self.hydrate(model, doc)?.downcast::<T>()?);
        }
        Ok(entities)
    }

    /// Ends the session: detaches every managed entity and drops staged
    /// changes. Registered types are kept.
    pub fn clear(&mut self) {
        self.identity.clear();
        self.unit.clear();
    }

    pub(crate) fn ready(&mut self) -> Result<()> {
        self.registry.catalog.link()
    }

    pub(crate) fn collection_name(&self, model: ModelId) -> String {
        self.registry.catalog.model(model).collection.clone()
    }

    fn persist_entity(
        &mut self,
        model: ModelId,
        entity: AnyEntity,
        visited: &mut HashSet<EntityKey>,
    ) -> Result<()> {
        let ops = self.registry.ops(model);
        let mut id = (ops.id)(&entity)?;
        if id.is_zero() {
            id = self.db.new_id();
            (ops.set_id)(&entity, id)?;
        }
        let key = (model, id);
        if !visited.insert(key) {
            return Ok(());
        }

        // A removal staged earlier in the session is superseded.
        self.unit.removes.shift_remove(&key);

        // Cascade before staging, so referenced entities hold identifiers by
        // the time this entity is serialized.
        for (index, target) in self.cascade_fields(model, |cascade| cascade.persist) {
            match (ops.get)(&entity, index)? {
                FieldValue::One(Some(child)) => self.persist_entity(target, child, visited)?,
                FieldValue::Many(children) => {
                    for child in children {
                        self.persist_entity(target, child, visited)?;
                    }
                }
                _ => {}
            }
        }

        if self.unit.inserts.contains_key(&key) || self.unit.updates.contains_key(&key) {
            // already staged
        } else if self.identity.contains(&key) {
            let doc = self.serialize(model, &entity)?;
            if self.identity.origin(&key) != Some(&doc) {
                self.unit.updates.insert(key, entity);
            }
        } else {
            self.identity.insert(key, entity.clone());
            self.unit.inserts.insert(key, entity);
        }

        Ok(())
    }

    fn remove_entity(
        &mut self,
        model: ModelId,
        entity: AnyEntity,
        visited: &mut HashSet<EntityKey>,
    ) -> Result<()> {
        let ops = self.registry.ops(model);
        let id = (ops.id)(&entity)?;
        if id.is_zero() {
            // never persisted
            return Ok(());
        }
        let key = (model, id);
        if !visited.insert(key) {
            return Ok(());
        }

        if self.unit.inserts.shift_remove(&key).is_some() {
            // the insert never happened; detach instead of deleting
            self.identity.remove(&key);
        } else {
            self.unit.updates.shift_remove(&key);
            self.unit.removes.insert(key, entity.clone());
        }

        for (index, target) in self.cascade_fields(model, |cascade| cascade.remove) {
            match (ops.get)(&entity, index)? {
                FieldValue::One(Some(child)) => self.remove_entity(target, child, visited)?,
                FieldValue::Many(children) => {
                    for child in children {
                        self.remove_entity(target, child, visited)?;
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Owning relationship fields of `model` whose cascade matches the
    /// predicate, with their resolved targets.
    fn cascade_fields(
        &self,
        model: ModelId,
        matches: fn(&mondo_core::schema::Cascade) -> bool,
    ) -> Vec<(usize, ModelId)> {
        self.registry
            .catalog
            .model(model)
            .fields
            .iter()
            .enumerate()
            .filter_map(|(index, field)| {
                let reference = field.reference()?;
                if reference.is_owning() && matches(&reference.cascade) {
                    Some((index, reference.target()))
                } else {
                    None
                }
            })
            .collect()
    }

    /// The `(type, id)` keys this entity's owning references point at.
    fn owning_children(&self, model: ModelId, entity: &AnyEntity) -> Result<Vec<EntityKey>> {
        let ops = self.registry.ops(model);
        let mut children = Vec::new();
        let references: Vec<(usize, ModelId)> = self
            .registry
            .catalog
            .model(model)
            .fields
            .iter()
            .enumerate()
            .filter_map(|(index, field)| {
                let reference = field.reference()?;
                reference.is_owning().then(|| (index, reference.target()))
            })
            .collect();
        for (index, target) in references {
            let child_ops = self.registry.ops(target);
            match (ops.get)(entity, index)? {
                FieldValue::One(Some(child)) => {
                    let id = (child_ops.id)(&child)?;
                    if !id.is_zero() {
                        children.push((target, id));
                    }
                }
                FieldValue::Many(list) => {
                    for child in list {
                        let id = (child_ops.id)(&child)?;
                        if !id.is_zero() {
                            children.push((target, id));
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(children)
    }

    /// Serializes an entity into its stored document: identity under `_id`,
    /// scalars under their storage names, owning references as identifiers,
    /// inverse sides omitted.
    pub(crate) fn serialize(&self, model: ModelId, entity: &AnyEntity) -> Result<Document> {
        let ops = self.registry.ops(model);
        let schema = self.registry.catalog.model(model);
        let mut doc = Document::new();
        doc.insert("_id", Value::ObjectId((ops.id)(entity)?));

        for (index, field) in schema.fields.iter().enumerate() {
            match &field.ty {
                FieldTy::Identity => {}
                FieldTy::Scalar => {
                    let value = (ops.get)(entity, index)?.into_scalar()?;
                    doc.insert(field.name.storage_name(), value);
                }
                FieldTy::ReferenceOne(reference) => {
                    if !reference.is_owning() {
                        continue;
                    }
                    let value = match (ops.get)(entity, index)?.into_one()? {
                        Some(child) => Value::ObjectId(self.reference_id(
                            reference.target(),
                            &child,
                            &schema.name,
                            &field.name.app_name,
                        )?),
                        None => Value::Null,
                    };
                    doc.insert(field.name.storage_name(), value);
                }
                FieldTy::ReferenceMany(reference) => {
                    if !reference.is_owning() {
                        continue;
                    }
                    let children = (ops.get)(entity, index)?.into_many()?;
                    let mut ids = Vec::with_capacity(children.len());
                    for child in children {
                        ids.push(Value::ObjectId(self.reference_id(
                            reference.target(),
                            &child,
                            &schema.name,
                            &field.name.app_name,
                        )?));
                    }
                    doc.insert(field.name.storage_name(), Value::Array(ids));
                }
            }
        }

        Ok(doc)
    }

    fn reference_id(
        &self,
        target: ModelId,
        child: &AnyEntity,
        model_name: &str,
        field_name: &str,
    ) -> Result<ObjectId> {
        let ops = self.registry.ops(target);
        let id = (ops.id)(child)?;
        if id.is_zero() {
            return Err(Error::integrity(format!(
                "`{model_name}.{field_name}` references an entity that was never persisted"
            )));
        }
        Ok(id)
    }

    pub(crate) fn query_many(&mut self, model: ModelId, filter: &Document) -> Result<Vec<Document>> {
        let collection = self.collection_name(model);
        let mut docs = Vec::new();
        for doc in self.db.collection(&collection).find_many(filter)? {
            docs.push(doc?);
        }
        Ok(docs)
    }
}

impl fmt::Debug for DocumentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentManager")
            .field("db", &self.db)
            .field("registered", &self.registry.catalog.len())
            .finish()
    }
}
