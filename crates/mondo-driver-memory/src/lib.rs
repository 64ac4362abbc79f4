//! An in-memory document store implementing the mondo driver abstraction.
//!
//! Collections are ordered maps of documents keyed by identifier. Filters get
//! MongoDB matching semantics: a filter value matches a stored field that
//! equals it, or a stored array that contains it. Cloning the driver shares
//! the store, so separate sessions can run against the same data.

use indexmap::IndexMap;
use mondo_core::doc::{Document, ObjectId, Value};
use mondo_core::driver::{Collection, Documents, Driver};
use mondo_core::{Error, Result};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

type Store = HashMap<String, IndexMap<ObjectId, Document>>;

#[derive(Debug, Clone)]
pub struct MemoryDriver {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    store: Mutex<Store>,

    /// Random per-driver bytes baked into every generated identifier.
    process: [u8; 5],
    counter: AtomicU32,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                store: Mutex::new(HashMap::new()),
                process: rand::random(),
                counter: AtomicU32::new(rand::random()),
            }),
        }
    }

    /// Number of documents currently stored in a collection.
    pub fn len(&self, collection: &str) -> usize {
        lock(&self.shared.store)
            .get(collection)
            .map_or(0, IndexMap::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for MemoryDriver {
    fn collection<'a>(&'a self, name: &str) -> Box<dyn Collection + 'a> {
        Box::new(MemoryCollection {
            shared: self.shared.clone(),
            name: name.to_string(),
        })
    }

    fn new_id(&self) -> ObjectId {
        // BSON ObjectId layout: 4-byte seconds, 5-byte process random,
        // 3-byte counter.
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as u32)
            .unwrap_or(0);
        let count = self.shared.counter.fetch_add(1, Ordering::Relaxed);

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&self.shared.process);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        ObjectId::from_bytes(bytes)
    }
}

struct MemoryCollection {
    shared: Arc<Shared>,
    name: String,
}

impl Collection for MemoryCollection {
    fn insert(&mut self, doc: Document) -> Result<()> {
        let id = document_id(&doc)?;
        let mut store = lock(&self.shared.store);
        let collection = store.entry(self.name.clone()).or_default();
        if collection.contains_key(&id) {
            return Err(Error::driver(format!(
                "duplicate _id {id} in collection `{}`",
                self.name
            )));
        }
        collection.insert(id, doc);
        Ok(())
    }

    fn update_by_id(&mut self, id: &ObjectId, doc: Document) -> Result<()> {
        let mut store = lock(&self.shared.store);
        match store.get_mut(&self.name).and_then(|collection| collection.get_mut(id)) {
            Some(slot) => {
                *slot = doc;
                Ok(())
            }
            None => Err(Error::driver(format!(
                "no document with _id {id} in collection `{}`",
                self.name
            ))),
        }
    }

    fn remove_by_id(&mut self, id: &ObjectId) -> Result<()> {
        let mut store = lock(&self.shared.store);
        if let Some(collection) = store.get_mut(&self.name) {
            collection.shift_remove(id);
        }
        Ok(())
    }

    fn find_one(&mut self, filter: &Document) -> Result<Option<Document>> {
        let store = lock(&self.shared.store);
        Ok(store.get(&self.name).and_then(|collection| {
            collection.values().find(|doc| matches(doc, filter)).cloned()
        }))
    }

    fn find_many(&mut self, filter: &Document) -> Result<Documents> {
        let store = lock(&self.shared.store);
        let docs: Vec<Document> = store
            .get(&self.name)
            .map(|collection| {
                collection
                    .values()
                    .filter(|doc| matches(doc, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(Box::new(docs.into_iter().map(Ok)))
    }
}

fn lock(store: &Mutex<Store>) -> MutexGuard<'_, Store> {
    store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn document_id(doc: &Document) -> Result<ObjectId> {
    doc.get("_id")
        .and_then(Value::as_object_id)
        .ok_or_else(|| Error::driver("document is missing `_id`"))
}

/// MongoDB matching: every filter entry must equal the stored field, or be
/// contained in it when the stored field is an array.
fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, expected)| match doc.get(key) {
        Some(actual) if actual == expected => true,
        Some(Value::Array(items)) => items.iter().any(|item| item == expected),
        _ => false,
    })
}
