mod document;
pub use document::Document;

mod object_id;
pub use object_id::ObjectId;

mod value;
pub use value::{FromValue, ToValue, Value};
