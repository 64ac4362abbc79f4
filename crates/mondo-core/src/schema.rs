pub mod annotation;

mod catalog;
pub use catalog::Catalog;

mod field;
pub use field::{Field, FieldDef, FieldDefKind, FieldId, FieldName, FieldTy};

mod model;
pub use model::{Model, ModelId};

mod relation;
pub use relation::{Cascade, Reference};
