use super::annotation::{self, ReferenceKind};
use super::{Cascade, Field, FieldDef, FieldDefKind, FieldId, FieldName, FieldTy, Reference};
use crate::{Error, Result};
use std::fmt;

/// Uniquely identifies a registered model within a catalog.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct ModelId(pub usize);

impl ModelId {
    pub(crate) const fn placeholder() -> Self {
        Self(usize::MAX)
    }
}

impl fmt::Debug for ModelId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "ModelId({})", self.0)
    }
}

/// Registration-time schema for a single entity type.
#[derive(Debug, Clone)]
pub struct Model {
    /// Uniquely identifies the model within the catalog
    pub id: ModelId,

    /// Registered name of the model
    pub name: String,

    /// Name of the collection documents are stored in
    pub collection: String,

    /// Fields declared by the entity type
    pub fields: Vec<Field>,

    /// Index of the identity field
    pub identity: usize,
}

impl Model {
    /// Builds a model from the field descriptors an entity type declares.
    /// Relationship annotations are parsed here.
    pub fn from_defs(name: &str, defs: &[FieldDef]) -> Result<Self> {
        let mut fields = Vec::with_capacity(defs.len());
        let mut identity = None;

        for (index, def) in defs.iter().enumerate() {
            let ty = match def.kind {
                FieldDefKind::Identity => {
                    if identity.is_some() {
                        return Err(Error::configuration(format!(
                            "`{name}` declares more than one identity field"
                        )));
                    }
                    identity = Some(index);
                    FieldTy::Identity
                }
                FieldDefKind::Scalar => FieldTy::Scalar,
                FieldDefKind::Relation(text) => {
                    let parsed = annotation::parse(text).map_err(|err| {
                        err.context(Error::configuration(format!(
                            "invalid relationship annotation on `{name}.{}`",
                            def.name
                        )))
                    })?;
                    if parsed.mapped_by.is_some() && parsed.cascade != Cascade::NONE {
                        return Err(Error::configuration(format!(
                            "`{name}.{}`: cascade is only valid on the owning side",
                            def.name
                        )));
                    }
                    let reference = Reference {
                        target_name: parsed.target,
                        mapped_by: parsed.mapped_by,
                        cascade: parsed.cascade,
                        target: None,
                        pair: None,
                    };
                    match parsed.kind {
                        ReferenceKind::One => FieldTy::ReferenceOne(reference),
                        ReferenceKind::Many => FieldTy::ReferenceMany(reference),
                    }
                }
            };
            fields.push(Field {
                id: FieldId::placeholder(),
                name: FieldName {
                    app_name: def.name.to_string(),
                    storage_name: def.storage.map(str::to_string),
                },
                ty,
            });
        }

        let Some(identity) = identity else {
            return Err(Error::configuration(format!(
                "`{name}` has no identity field"
            )));
        };

        Ok(Self {
            id: ModelId::placeholder(),
            name: name.to_string(),
            collection: name.to_string(),
            fields,
            identity,
        })
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name.app_name == name)
    }

    pub fn identity_field(&self) -> &Field {
        &self.fields[self.identity]
    }
}
