use super::Error;

use std::fmt;

/// Free-form error text, for failures that fit none of the dedicated kinds
/// and for context frames added while an error travels up.
#[derive(Debug)]
pub(super) struct Adhoc {
    message: Box<str>,
}

impl Adhoc {
    pub(super) fn new(message: String) -> Adhoc {
        Adhoc {
            message: message.into_boxed_str(),
        }
    }
}

impl std::error::Error for Adhoc {}

impl fmt::Display for Adhoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error {
    /// Creates an error from a format string.
    ///
    /// Mostly useful as a context frame for [`Error::context`]; failures the
    /// mapper itself detects come through one of the dedicated constructors.
    ///
    /// # Examples
    ///
    /// ```
    /// use mondo_core::Error;
    ///
    /// let collection = "User";
    /// let err = Error::not_found("no match")
    ///     .context(Error::from_args(format_args!("loading `{collection}`")));
    /// assert_eq!(err.to_string(), "loading `User`: document not found: no match");
    /// ```
    pub fn from_args<'a>(message: fmt::Arguments<'a>) -> Error {
        Error::from(super::ErrorKind::Adhoc(Adhoc::new(message.to_string())))
    }

    /// Returns `true` if this error is an adhoc error.
    pub fn is_adhoc(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Adhoc(_))
    }
}
