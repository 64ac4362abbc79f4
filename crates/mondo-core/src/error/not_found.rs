use super::Error;

use std::fmt;

/// A lookup by id or filter that matched no document.
#[derive(Debug)]
pub(super) struct NotFound {
    context: Box<str>,
}

impl std::error::Error for NotFound {}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "document not found: {}", self.context)
    }
}

impl Error {
    /// Creates a not found error.
    ///
    /// This is the sentinel returned by `find_id` and `find_one` when no
    /// document matches; callers tell it apart with
    /// [`Error::is_not_found`]. The context names what was looked up.
    ///
    /// # Examples
    ///
    /// ```
    /// use mondo_core::Error;
    ///
    /// let err = Error::not_found("collection=User id=123");
    /// assert!(err.is_not_found());
    /// ```
    pub fn not_found(context: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::NotFound(NotFound {
            context: context.into().into_boxed_str(),
        }))
    }

    /// Returns `true` if this error is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::NotFound(_))
    }
}
