use crate::entity::{AnyEntity, Entity, FieldValue};
use crate::manager::DocumentManager;
use mondo_core::doc::ObjectId;
use mondo_core::schema::{Catalog, Model, ModelId};
use mondo_core::{Error, Result};

use std::any::TypeId;
use std::collections::HashMap;

/// Per-type accessors produced at registration. Everything the manager does
/// to an entity afterwards goes through these monomorphized entry points; hot
/// paths never introspect a value again.
#[derive(Clone, Copy)]
pub(crate) struct EntityOps {
    pub(crate) new: fn() -> AnyEntity,
    pub(crate) id: fn(&AnyEntity) -> Result<ObjectId>,
    pub(crate) set_id: fn(&AnyEntity, ObjectId) -> Result<()>,
    pub(crate) get: fn(&AnyEntity, usize) -> Result<FieldValue>,
    pub(crate) set: fn(&AnyEntity, usize, FieldValue) -> Result<()>,
}

/// The catalog plus everything the manager needs to bridge from Rust types to
/// registered models.
#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) catalog: Catalog,
    ops: Vec<EntityOps>,
    by_type: HashMap<TypeId, ModelId>,
}

impl Registry {
    pub(crate) fn register<T: Entity + Default>(&mut self, name: &str) -> Result<()> {
        if self.by_type.contains_key(&TypeId::of::<T>()) {
            return Err(Error::configuration(format!(
                "`{}` is already registered",
                std::any::type_name::<T>()
            )));
        }
        let model = Model::from_defs(name, &T::entity_fields())?;
        let id = self.catalog.register(model)?;
        self.ops.push(EntityOps {
            new: || AnyEntity::new(T::default()),
            id: |entity| Ok(entity.downcast::<T>()?.borrow().entity_id()),
            set_id: |entity, id| {
                entity.downcast::<T>()?.borrow_mut().set_entity_id(id);
                Ok(())
            },
            get: |entity, index| Ok(entity.downcast::<T>()?.borrow().field(index)),
            set: |entity, index, value| {
                entity.downcast::<T>()?.borrow_mut().set_field(index, value)
            },
        });
        self.by_type.insert(TypeId::of::<T>(), id);
        Ok(())
    }

    pub(crate) fn ops(&self, id: ModelId) -> EntityOps {
        self.ops[id.0]
    }

    pub(crate) fn model_of<T: Entity>(&self) -> Result<ModelId> {
        self.by_type
            .get(&TypeId::of::<T>())
            .copied()
            .ok_or_else(|| {
                Error::usage(format!(
                    "`{}` is not a registered type",
                    std::any::type_name::<T>()
                ))
            })
    }
}

/// A deferred registration, as produced by the [`models!`](crate::models)
/// macro.
pub struct Registration {
    name: &'static str,
    register: fn(&mut DocumentManager, &'static str) -> Result<()>,
}

impl Registration {
    pub fn of<T: Entity + Default>(name: &'static str) -> Self {
        Self {
            name,
            register: |manager, name| manager.register::<T>(name),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn apply(&self, manager: &mut DocumentManager) -> Result<()> {
        (self.register)(manager, self.name)
    }
}

/// Builds registrations for a list of entity types, registering each under
/// its type name.
///
/// ```ignore
/// manager.register_many(&models![User, Post, Role])?;
/// ```
#[macro_export]
macro_rules! models {
    ($($ty:ty),* $(,)?) => {
        [$($crate::Registration::of::<$ty>(::core::stringify!($ty))),*]
    };
}
