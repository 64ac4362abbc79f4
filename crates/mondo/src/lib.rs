mod entity;
pub use entity::{AnyEntity, Entity, FieldValue, Ref};

mod hydrate;

mod identity;

mod manager;
pub use manager::DocumentManager;

mod registry;
pub use registry::Registration;

mod unit_of_work;

pub use mondo_macros::Entity;

pub use mondo_core::doc::{Document, ObjectId, Value};
pub use mondo_core::{doc, schema, Error, Result};

pub mod driver {
    pub use mondo_core::driver::*;
}

#[doc(hidden)]
pub mod codegen_support {
    pub use crate::entity::{typed_many, typed_one, untyped_many, untyped_one};
    pub use mondo_core::doc::{FromValue, ToValue};
    pub use mondo_core::schema::FieldDef;
}
