use super::Error;

use std::fmt;

/// An invalid type registration or relationship mapping: duplicate
/// registrations, malformed relationship annotations, unresolvable target
/// types, owning/inverse pairs that do not line up.
#[derive(Debug)]
pub(super) struct Configuration {
    message: Box<str>,
}

impl std::error::Error for Configuration {}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration: {}", self.message)
    }
}

impl Error {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Configuration(Configuration {
            message: message.into().into_boxed_str(),
        }))
    }

    /// Returns `true` if this error is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Configuration(_))
    }
}
