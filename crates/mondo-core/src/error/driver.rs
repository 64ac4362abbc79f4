use super::Error;

use std::fmt;

/// An error surfaced by the underlying store, carried verbatim.
#[derive(Debug)]
pub(super) struct DriverFailed {
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl std::error::Error for DriverFailed {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl fmt::Display for DriverFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "driver error: {}", self.source)
    }
}

impl Error {
    /// Creates a driver error from the underlying store's error.
    pub fn driver(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Error {
        Error::from(super::ErrorKind::Driver(DriverFailed {
            source: source.into(),
        }))
    }

    /// Returns `true` if this error is a driver error.
    pub fn is_driver(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Driver(_))
    }
}
