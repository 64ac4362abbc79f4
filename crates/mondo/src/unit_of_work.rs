use crate::entity::AnyEntity;
use crate::identity::EntityKey;

use indexmap::IndexMap;

/// The three stage tables of a session. An entity is in at most one of them;
/// iteration order is staging order, which breaks ties when the flush order
/// is computed.
#[derive(Default)]
pub(crate) struct UnitOfWork {
    pub(crate) inserts: IndexMap<EntityKey, AnyEntity>,
    pub(crate) updates: IndexMap<EntityKey, AnyEntity>,
    pub(crate) removes: IndexMap<EntityKey, AnyEntity>,
}

impl UnitOfWork {
    pub(crate) fn is_staged(&self, key: &EntityKey) -> bool {
        self.inserts.contains_key(key)
            || self.updates.contains_key(key)
            || self.removes.contains_key(key)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.removes.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.inserts.clear();
        self.updates.clear();
        self.removes.clear();
    }
}

/// Orders staged keys so that every in-set dependency of a key is emitted
/// before the key itself; staging order is the secondary key. Dependency
/// cycles fall back to staging order, which is safe because identifiers are
/// assigned at persist time, not at write time.
pub(crate) fn staged_order<V, F>(staged: &IndexMap<EntityKey, V>, mut deps: F) -> Vec<EntityKey>
where
    F: FnMut(&EntityKey) -> Vec<EntityKey>,
{
    let keys: Vec<EntityKey> = staged.keys().copied().collect();
    let dep_lists: Vec<Vec<EntityKey>> = keys
        .iter()
        .map(|key| {
            deps(key)
                .into_iter()
                .filter(|dep| dep != key && staged.contains_key(dep))
                .collect()
        })
        .collect();

    let mut emitted = std::collections::HashSet::with_capacity(keys.len());
    let mut order = Vec::with_capacity(keys.len());

    while order.len() < keys.len() {
        let mut progressed = false;
        for (i, key) in keys.iter().enumerate() {
            if emitted.contains(key) {
                continue;
            }
            if dep_lists[i].iter().all(|dep| emitted.contains(dep)) {
                emitted.insert(*key);
                order.push(*key);
                progressed = true;
            }
        }
        if !progressed {
            for key in &keys {
                if emitted.insert(*key) {
                    order.push(*key);
                }
            }
        }
    }

    order
}
