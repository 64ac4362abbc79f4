use super::Error;

use std::fmt;

/// A stored graph that cannot be written or resolved consistently, such as
/// an owning reference to an entity that was never assigned an identifier.
#[derive(Debug)]
pub(super) struct Integrity {
    message: Box<str>,
}

impl std::error::Error for Integrity {}

impl fmt::Display for Integrity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "integrity error: {}", self.message)
    }
}

impl Error {
    /// Creates an integrity error.
    pub fn integrity(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Integrity(Integrity {
            message: message.into().into_boxed_str(),
        }))
    }

    /// Returns `true` if this error is an integrity error.
    pub fn is_integrity(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Integrity(_))
    }
}
