use super::{FieldId, ModelId};

/// Cascade policy carried by an owning-side relationship.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cascade {
    pub persist: bool,
    pub remove: bool,
}

impl Cascade {
    pub const NONE: Self = Self {
        persist: false,
        remove: false,
    };
    pub const PERSIST: Self = Self {
        persist: true,
        remove: false,
    };
    pub const REMOVE: Self = Self {
        persist: false,
        remove: true,
    };
    pub const ALL: Self = Self {
        persist: true,
        remove: true,
    };
}

/// One side of a relationship between two registered types.
///
/// The side is owning when `mapped_by` is absent: the stored document then
/// carries the referenced identifier(s) under the field's storage name.
/// An inverse side is never written; it is resolved by querying the owning
/// collection.
#[derive(Debug, Clone)]
pub struct Reference {
    /// Registered name of the related type, as written in the annotation.
    pub target_name: String,

    /// For an inverse side, the owning field's declared name on the target.
    pub mapped_by: Option<String>,

    /// Cascade policy; only an owning side may carry one.
    pub cascade: Cascade,

    pub(crate) target: Option<ModelId>,
    pub(crate) pair: Option<FieldId>,
}

impl Reference {
    pub fn is_owning(&self) -> bool {
        self.mapped_by.is_none()
    }

    /// Resolved target model. Available once the catalog is linked.
    #[track_caller]
    pub fn target(&self) -> ModelId {
        match self.target {
            Some(id) => id,
            None => panic!("catalog is not linked"),
        }
    }

    /// The owning-side companion of an inverse reference. Available once the
    /// catalog is linked.
    #[track_caller]
    pub fn pair(&self) -> FieldId {
        match self.pair {
            Some(id) => id,
            None => panic!("reference has no owning companion (owning side or unlinked catalog)"),
        }
    }
}
