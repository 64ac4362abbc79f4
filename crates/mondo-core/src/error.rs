mod adhoc;
mod configuration;
mod driver;
mod integrity;
mod not_found;
mod usage;

use adhoc::Adhoc;
use configuration::Configuration;
use driver::DriverFailed;
use integrity::Integrity;
use not_found::NotFound;
use usage::Usage;

use std::fmt;
use std::sync::Arc;

/// An error that can occur in mondo.
///
/// Errors are a single shared pointer, so they are cheap to clone and to
/// thread through the session. A failure picked up near the driver can be
/// wrapped with higher-level context on its way back to the caller; the
/// outermost wrapper renders first and the root cause last.
#[derive(Clone)]
pub struct Error {
    repr: Arc<Repr>,
}

#[derive(Debug)]
struct Repr {
    kind: ErrorKind,
    cause: Option<Error>,
}

#[derive(Debug)]
enum ErrorKind {
    Adhoc(Adhoc),
    Configuration(Configuration),
    Driver(DriverFailed),
    Integrity(Integrity),
    NotFound(NotFound),
    Usage(Usage),
}

impl Error {
    /// Wraps this error in a higher-level one.
    ///
    /// `outer` becomes the visible error and `self` its cause, so the
    /// rendered text reads from the failed operation down to the root:
    /// `"registering `User`: invalid configuration: ..."`.
    pub fn context(self, outer: Error) -> Error {
        let Repr { kind, cause } = match Arc::try_unwrap(outer.repr) {
            Ok(repr) => repr,
            // someone else still holds the outer error; freeze its rendered
            // text instead of mutating shared state
            Err(shared) => Repr {
                kind: ErrorKind::Adhoc(Adhoc::new(Error { repr: shared }.to_string())),
                cause: None,
            },
        };
        debug_assert!(cause.is_none(), "an error used as context cannot itself be chained");
        Error {
            repr: Arc::new(Repr {
                kind,
                cause: Some(self),
            }),
        }
    }

    fn kind(&self) -> &ErrorKind {
        &self.repr.kind
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        // the wrapped error is the source when one exists; a bare driver
        // failure exposes the store's own error instead
        if let Some(cause) = &self.repr.cause {
            return Some(cause);
        }
        match self.kind() {
            ErrorKind::Driver(failed) => Some(failed),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repr.kind)?;
        if let Some(cause) = &self.repr.cause {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !f.alternate() {
            return write!(f, "{self}");
        }
        // `{:#?}` renders the chain as a list of kinds, outermost first
        let mut frames = f.debug_list();
        let mut current = Some(self);
        while let Some(err) = current {
            frames.entry(&err.repr.kind);
            current = err.repr.cause.as_ref();
        }
        frames.finish()
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Adhoc(err) => write!(f, "{err}"),
            ErrorKind::Configuration(err) => write!(f, "{err}"),
            ErrorKind::Driver(err) => write!(f, "{err}"),
            ErrorKind::Integrity(err) => write!(f, "{err}"),
            ErrorKind::NotFound(err) => write!(f, "{err}"),
            ErrorKind::Usage(err) => write!(f, "{err}"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            repr: Arc::new(Repr { kind, cause: None }),
        }
    }
}
