use mondo_core::doc::{ObjectId, Value};
use mondo_core::schema::FieldDef;
use mondo_core::{Error, Result};

use std::any::Any;
use std::cell::{Ref as CellRef, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// The capability set a record type exposes to the document manager: read and
/// write the identity, enumerate field descriptors, and read or write a field
/// by its descriptor index.
///
/// Implemented by `#[derive(Entity)]`; the manager never introspects a value
/// beyond this trait.
pub trait Entity: Sized + 'static {
    /// Field descriptors in declaration order. Indices passed to
    /// [`Entity::field`] and [`Entity::set_field`] refer to this order.
    fn entity_fields() -> Vec<FieldDef>;

    /// The identity value; all-zero means not yet persisted.
    fn entity_id(&self) -> ObjectId;

    fn set_entity_id(&mut self, id: ObjectId);

    fn field(&self, index: usize) -> FieldValue;

    fn set_field(&mut self, index: usize, value: FieldValue) -> Result<()>;
}

/// Shared handle to an entity.
///
/// Entities form object graphs with cycles (an owning side can reference an
/// inverse side that refers back), so both relationship fields and the values
/// returned by the finder methods hand out shared handles. The identity map
/// guarantees one handle target per `(type, id)` within a session;
/// [`Ref::ptr_eq`] observes that.
pub struct Ref<T> {
    inner: Rc<RefCell<T>>,
}

impl<T> Ref<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(value)),
        }
    }

    pub fn borrow(&self) -> CellRef<'_, T> {
        self.inner.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.inner.borrow_mut()
    }

    /// Returns `true` if both handles point at the same entity.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(value) => value.fmt(fmt),
            Err(_) => fmt.write_str("<borrowed>"),
        }
    }
}

/// A type-erased entity handle, as stored in the identity map and the stage
/// tables.
#[derive(Clone)]
pub struct AnyEntity {
    inner: Rc<dyn Any>,
}

impl AnyEntity {
    pub fn new<T: Entity>(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(value)),
        }
    }

    pub fn from_ref<T: Entity>(entity: &Ref<T>) -> Self {
        Self {
            inner: entity.inner.clone(),
        }
    }

    pub fn downcast<T: Entity>(&self) -> Result<Ref<T>> {
        self.inner
            .clone()
            .downcast::<RefCell<T>>()
            .map(|inner| Ref { inner })
            .map_err(|_| {
                Error::usage(format!(
                    "entity is not a `{}`",
                    std::any::type_name::<T>()
                ))
            })
    }

    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }
}

impl fmt::Debug for AnyEntity {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str("AnyEntity(..)")
    }
}

/// A field value flowing between an entity and the document manager.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// A scalar (or identity) field value.
    Scalar(Value),

    /// An owning or inverse single reference.
    One(Option<AnyEntity>),

    /// An owning or inverse reference list.
    Many(Vec<AnyEntity>),
}

impl FieldValue {
    pub fn into_scalar(self) -> Result<Value> {
        match self {
            Self::Scalar(value) => Ok(value),
            other => Err(shape_err(&other, "a scalar")),
        }
    }

    pub fn into_one(self) -> Result<Option<AnyEntity>> {
        match self {
            Self::One(value) => Ok(value),
            other => Err(shape_err(&other, "a single reference")),
        }
    }

    pub fn into_many(self) -> Result<Vec<AnyEntity>> {
        match self {
            Self::Many(value) => Ok(value),
            other => Err(shape_err(&other, "a reference list")),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "a scalar",
            Self::One(_) => "a single reference",
            Self::Many(_) => "a reference list",
        }
    }
}

fn shape_err(value: &FieldValue, expected: &str) -> Error {
    Error::usage(format!("expected {expected}, found {}", value.name()))
}

// Bridges between typed relationship fields and their erased form, used by
// the code the derive macro generates.

pub fn untyped_one<T: Entity>(field: &Option<Ref<T>>) -> Option<AnyEntity> {
    field.as_ref().map(AnyEntity::from_ref)
}

pub fn untyped_many<T: Entity>(field: &[Ref<T>]) -> Vec<AnyEntity> {
    field.iter().map(AnyEntity::from_ref).collect()
}

pub fn typed_one<T: Entity>(value: FieldValue) -> Result<Option<Ref<T>>> {
    value
        .into_one()?
        .map(|entity| entity.downcast::<T>())
        .transpose()
}

pub fn typed_many<T: Entity>(value: FieldValue) -> Result<Vec<Ref<T>>> {
    value
        .into_many()?
        .iter()
        .map(AnyEntity::downcast)
        .collect()
}
