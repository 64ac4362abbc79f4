pub mod doc;
pub use doc::Document;

pub mod driver;
pub use driver::Driver;

mod error;
pub use error::Error;

pub mod schema;
pub use schema::Catalog;

/// A Result type alias that uses mondo's [`Error`] type.
pub type Result<T, E = Error> = core::result::Result<T, E>;
