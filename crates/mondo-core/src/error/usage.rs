use super::Error;

use std::fmt;

/// An API misuse by the caller, such as operating on a value of an
/// unregistered type or a field value that does not convert to the declared
/// field shape.
#[derive(Debug)]
pub(super) struct Usage {
    message: Box<str>,
}

impl std::error::Error for Usage {}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid usage: {}", self.message)
    }
}

impl Error {
    /// Creates a usage error.
    pub fn usage(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Usage(Usage {
            message: message.into().into_boxed_str(),
        }))
    }

    /// Returns `true` if this error is a usage error.
    pub fn is_usage(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Usage(_))
    }
}
