use super::Value;
use indexmap::IndexMap;

/// An ordered set of key/value entries: the stored form of an entity, and
/// also the opaque filter type passed through to the driver unchanged.
///
/// Keys are stored verbatim; no case coercion is applied anywhere.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Document {
    entries: IndexMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Builds a [`Document`] from `key: value` pairs.
///
/// ```
/// use mondo_core::doc;
///
/// let filter = doc! { "Name": "John", "active": true };
/// assert_eq!(filter.len(), 2);
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::doc::Document::new()
    };
    ($($key:tt : $value:expr),+ $(,)?) => {{
        let mut document = $crate::doc::Document::new();
        $( document.insert($key, $crate::doc::Value::from($value)); )+
        document
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::ObjectId;

    #[test]
    fn insert_preserves_order() {
        let mut doc = Document::new();
        doc.insert("_id", ObjectId::from_bytes([1; 12]));
        doc.insert("Title", "First");
        doc.insert("Body", "hello");

        let keys: Vec<&str> = doc.keys().collect();
        assert_eq!(keys, ["_id", "Title", "Body"]);
    }

    #[test]
    fn equality_ignores_entry_order() {
        let mut a = Document::new();
        a.insert("x", 1);
        a.insert("y", 2);

        let mut b = Document::new();
        b.insert("y", 2);
        b.insert("x", 1);

        assert_eq!(a, b);
    }

    #[test]
    fn doc_macro() {
        let doc = crate::doc! { "Name": "John", "count": 3i64 };
        assert_eq!(doc.get("Name").and_then(Value::as_str), Some("John"));
        assert_eq!(doc.get("count").and_then(Value::as_i64), Some(3));
        assert!(crate::doc! {}.is_empty());
    }
}
