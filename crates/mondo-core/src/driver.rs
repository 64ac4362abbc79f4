use crate::doc::{Document, ObjectId};
use crate::Result;

use std::fmt::Debug;

/// Owned iterator over the documents produced by a query.
pub type Documents = Box<dyn Iterator<Item = Result<Document>>>;

/// Handle to a database, implemented by storage drivers.
///
/// Calls block the caller; a session issues them strictly sequentially, so a
/// driver needs no coordination beyond whatever its own handle requires.
pub trait Driver: Debug + 'static {
    /// Returns a handle to the named collection.
    fn collection<'a>(&'a self, name: &str) -> Box<dyn Collection + 'a>;

    /// Generates a fresh document identifier. Must never return the all-zero
    /// marker.
    fn new_id(&self) -> ObjectId;
}

/// A single named collection of documents.
///
/// Filters are opaque documents passed through from the caller unchanged; a
/// driver is expected to give them MongoDB semantics, where a filter value
/// also matches a stored array field containing it.
pub trait Collection {
    /// Stores a new document. The document carries its `_id`.
    fn insert(&mut self, doc: Document) -> Result<()>;

    /// Replaces the document with the given id.
    fn update_by_id(&mut self, id: &ObjectId, doc: Document) -> Result<()>;

    /// Deletes the document with the given id.
    fn remove_by_id(&mut self, id: &ObjectId) -> Result<()>;

    /// Returns the first document matching the filter.
    fn find_one(&mut self, filter: &Document) -> Result<Option<Document>>;

    /// Returns all documents matching the filter.
    fn find_many(&mut self, filter: &Document) -> Result<Documents>;
}
