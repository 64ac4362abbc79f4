use super::{ModelId, Reference};
use std::fmt;

/// Uniquely identifies a field within a catalog.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct FieldId {
    pub model: ModelId,
    pub index: usize,
}

impl FieldId {
    pub(crate) fn placeholder() -> Self {
        Self {
            model: ModelId::placeholder(),
            index: usize::MAX,
        }
    }
}

impl fmt::Debug for FieldId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "FieldId({}/{})", self.model.0, self.index)
    }
}

/// The declared field name plus an optional storage-key override.
#[derive(Debug, Clone)]
pub struct FieldName {
    pub app_name: String,
    pub storage_name: Option<String>,
}

impl FieldName {
    /// The key the field is stored under. Falls back to the declared name,
    /// verbatim.
    pub fn storage_name(&self) -> &str {
        self.storage_name.as_deref().unwrap_or(&self.app_name)
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    /// Uniquely identifies the field within the containing model.
    pub id: FieldId,

    /// The field name
    pub name: FieldName,

    /// Identity, scalar, or relationship
    pub ty: FieldTy,
}

#[derive(Debug, Clone)]
pub enum FieldTy {
    /// The field holding the document identifier; stored as `_id`.
    Identity,

    /// A plain field persisted inline under its storage name.
    Scalar,

    /// A single reference to another registered type.
    ReferenceOne(Reference),

    /// An ordered list of references to another registered type.
    ReferenceMany(Reference),
}

impl Field {
    pub fn is_relation(&self) -> bool {
        self.ty.is_relation()
    }

    pub fn reference(&self) -> Option<&Reference> {
        self.ty.as_reference()
    }
}

impl FieldTy {
    pub fn is_relation(&self) -> bool {
        matches!(self, Self::ReferenceOne(_) | Self::ReferenceMany(_))
    }

    pub fn is_reference_many(&self) -> bool {
        matches!(self, Self::ReferenceMany(_))
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Self::ReferenceOne(reference) | Self::ReferenceMany(reference) => Some(reference),
            _ => None,
        }
    }

    pub(crate) fn as_reference_mut(&mut self) -> Option<&mut Reference> {
        match self {
            Self::ReferenceOne(reference) | Self::ReferenceMany(reference) => Some(reference),
            _ => None,
        }
    }
}

/// Field descriptor emitted by an entity type at registration.
///
/// The relationship annotation is carried verbatim and parsed when the model
/// is built.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub storage: Option<&'static str>,
    pub kind: FieldDefKind,
}

#[derive(Debug, Clone, Copy)]
pub enum FieldDefKind {
    Identity,
    Scalar,
    Relation(&'static str),
}

impl FieldDef {
    pub const fn identity(name: &'static str, storage: Option<&'static str>) -> Self {
        Self {
            name,
            storage,
            kind: FieldDefKind::Identity,
        }
    }

    pub const fn scalar(name: &'static str, storage: Option<&'static str>) -> Self {
        Self {
            name,
            storage,
            kind: FieldDefKind::Scalar,
        }
    }

    pub const fn relation(
        name: &'static str,
        storage: Option<&'static str>,
        annotation: &'static str,
    ) -> Self {
        Self {
            name,
            storage,
            kind: FieldDefKind::Relation(annotation),
        }
    }
}
