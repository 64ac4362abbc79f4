use crate::entity::AnyEntity;
use mondo_core::doc::{Document, ObjectId};
use mondo_core::schema::ModelId;

use std::collections::HashMap;

/// Session-scoped key of a managed entity.
pub(crate) type EntityKey = (ModelId, ObjectId);

/// The per-session identity map: one live entity per `(type, id)`, plus the
/// origin snapshot used for dirty detection.
///
/// Inserts are exclusive; the first entity stored under a key stays
/// authoritative for the whole session.
#[derive(Default)]
pub(crate) struct IdentityMap {
    entries: HashMap<EntityKey, Entry>,
}

struct Entry {
    entity: AnyEntity,

    /// The stored document captured on hydration or on the first successful
    /// write; `None` while an insert is still staged.
    origin: Option<Document>,
}

impl IdentityMap {
    pub(crate) fn get(&self, key: &EntityKey) -> Option<AnyEntity> {
        self.entries.get(key).map(|entry| entry.entity.clone())
    }

    pub(crate) fn contains(&self, key: &EntityKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Inserts a freshly persisted entity. Returns the already-managed entity
    /// instead when the key is taken.
    pub(crate) fn insert(&mut self, key: EntityKey, entity: AnyEntity) -> AnyEntity {
        self.entries
            .entry(key)
            .or_insert(Entry {
                entity,
                origin: None,
            })
            .entity
            .clone()
    }

    /// Inserts a hydrated entity together with its origin snapshot. Returns
    /// the already-managed entity instead when the key is taken.
    pub(crate) fn insert_hydrated(
        &mut self,
        key: EntityKey,
        entity: AnyEntity,
        origin: Document,
    ) -> AnyEntity {
        self.entries
            .entry(key)
            .or_insert(Entry {
                entity,
                origin: Some(origin),
            })
            .entity
            .clone()
    }

    pub(crate) fn origin(&self, key: &EntityKey) -> Option<&Document> {
        self.entries.get(key).and_then(|entry| entry.origin.as_ref())
    }

    /// Records the document written for an entity, making the entry managed
    /// and clean.
    pub(crate) fn set_origin(&mut self, key: EntityKey, entity: &AnyEntity, origin: Document) {
        self.entries
            .entry(key)
            .or_insert_with(|| Entry {
                entity: entity.clone(),
                origin: None,
            })
            .origin = Some(origin);
    }

    pub(crate) fn remove(&mut self, key: &EntityKey) {
        self.entries.remove(key);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{AnyEntity, Entity, FieldValue};
    use mondo_core::schema::FieldDef;
    use mondo_core::Result;

    #[derive(Default)]
    struct Probe {
        id: ObjectId,
    }

    impl Entity for Probe {
        fn entity_fields() -> Vec<FieldDef> {
            vec![FieldDef::identity("id", None)]
        }

        fn entity_id(&self) -> ObjectId {
            self.id
        }

        fn set_entity_id(&mut self, id: ObjectId) {
            self.id = id;
        }

        fn field(&self, _index: usize) -> FieldValue {
            FieldValue::Scalar(mondo_core::doc::Value::ObjectId(self.id))
        }

        fn set_field(&mut self, _index: usize, _value: FieldValue) -> Result<()> {
            Ok(())
        }
    }

    fn key(byte: u8) -> EntityKey {
        (ModelId(0), ObjectId::from_bytes([byte; 12]))
    }

    #[test]
    fn insert_is_exclusive() {
        let mut map = IdentityMap::default();
        let first = AnyEntity::new(Probe::default());
        let second = AnyEntity::new(Probe::default());

        let stored = map.insert(key(1), first.clone());
        assert!(AnyEntity::ptr_eq(&stored, &first));

        let stored = map.insert(key(1), second);
        assert!(AnyEntity::ptr_eq(&stored, &first));
    }

    #[test]
    fn origin_tracks_written_documents() {
        let mut map = IdentityMap::default();
        let entity = AnyEntity::new(Probe::default());

        map.insert(key(2), entity.clone());
        assert!(map.origin(&key(2)).is_none());

        let mut doc = Document::new();
        doc.insert("_id", ObjectId::from_bytes([2; 12]));
        map.set_origin(key(2), &entity, doc.clone());
        assert_eq!(map.origin(&key(2)), Some(&doc));

        map.remove(&key(2));
        assert!(map.get(&key(2)).is_none());
    }
}
