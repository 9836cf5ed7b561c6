use crate::common::{Value, DOC_CREATED_AT, DOC_ID, DOC_UPDATED_AT};
use crate::errors::{ErrorKind, KvDocError, KvDocResult};
use chrono::{DateTime, Utc};
use im::OrdMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt::{Debug, Display};

pub(crate) type FieldVec = SmallVec<[String; 8]>;

/// A schemaless document stored in a collection.
///
/// A document is an ordered set of field name to [Value] pairs and is stored as a
/// JSON object. Three fields are owned by the engine and written on every insert
/// and update:
///
/// * `id` - the identifier assigned from the collection's sequence on insert
/// * `createdAt` - the insertion time, never changed afterwards
/// * `updatedAt` - the time of the last insert or update
///
/// Fields are kept in a persistent `im::OrdMap`, so cloning a document is O(1)
/// and a mutated clone shares most of its structure with the original.
#[derive(Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    data: OrdMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Document {
            data: OrdMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates `value` with `key`, replacing any previous value.
    ///
    /// # Arguments
    ///
    /// * `key` - The field name. Cannot be empty.
    /// * `value` - Anything convertible into a [Value].
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the key is empty.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let mut doc = Document::new();
    /// doc.put("name", "Alice")?;
    /// doc.put("age", 30)?;
    /// assert_eq!(doc.size(), 2);
    /// ```
    pub fn put<T: Into<Value>>(&mut self, key: impl Into<String>, value: T) -> KvDocResult<()> {
        let key = key.into();
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(KvDocError::new(
                "Document does not support empty key",
                ErrorKind::InvalidOperation,
            ));
        }
        self.data.insert(key, value.into());
        Ok(())
    }

    #[doc(hidden)]
    pub fn put_field(&mut self, key: String, value: Value) {
        self.data.insert(key, value);
    }

    /// Returns the value of a top-level field, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Returns the value of a top-level field if it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns the engine-assigned identifier, if the document carries one.
    pub fn id(&self) -> Option<&str> {
        self.get_str(DOC_ID)
    }

    /// Returns the insertion timestamp, if present and well formed.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp(DOC_CREATED_AT)
    }

    /// Returns the last modification timestamp, if present and well formed.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp(DOC_UPDATED_AT)
    }

    fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        self.get_str(key)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|at| at.with_timezone(&Utc))
    }

    /// Names of all top-level fields, in ascending order.
    pub fn fields(&self) -> FieldVec {
        self.data.keys().cloned().collect()
    }

    /// Names of the top-level fields whose value is a string, in ascending order.
    pub fn string_fields(&self) -> FieldVec {
        self.data
            .iter()
            .filter(|(_, v)| v.is_string())
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Encodes the document as JSON bytes.
    pub fn to_bytes(&self) -> KvDocResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes a document from JSON bytes. The input must be a JSON object.
    pub fn from_bytes(bytes: &[u8]) -> KvDocResult<Document> {
        serde_json::from_slice(bytes).map_err(|err| {
            log::error!("Failed to decode stored document: {}", err);
            KvDocError::from(err)
        })
    }
}

impl From<BTreeMap<String, Value>> for Document {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Document {
            data: map.into_iter().collect(),
        }
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc.to_map())
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::Object(self.to_map()))
    }
}

#[doc(hidden)]
pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// # Examples
///
/// ```rust
/// use kvdoc::doc;
///
/// let empty = doc!{};
///
/// let user = doc!{
///     name: "Alice",
///     "email": "alice@mail.net",
///     age: 30,
///     address: {
///         city: "New York",
///     },
///     tags: ["admin", "user"]
/// };
/// assert_eq!(user.get_str("name"), Some("Alice"));
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::collection::Document::new()
    };

    ({}) => {
        $crate::collection::Document::new()
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            let mut doc = $crate::collection::Document::new();
            $(
                doc.put_field(
                    $crate::collection::normalize(stringify!($key)),
                    $crate::doc_value!($value),
                );
            )*
            doc
        }
    };
}

/// Converts one right-hand side of [doc!] into a [Value].
#[doc(hidden)]
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::from($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
