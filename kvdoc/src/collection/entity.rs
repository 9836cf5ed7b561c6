use crate::collection::Document;
use crate::common::{is_id_field, Value, DOC_CREATED_AT, DOC_ID, DOC_UPDATED_AT, RESERVED_FIELDS};
use crate::errors::{KvDocError, KvDocResult};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Which fields of an entity type are maintained in secondary indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFields {
    /// A fixed list of string-valued field names.
    Declared(&'static [&'static str]),
    /// Every string-valued field found on each stored document.
    Discover,
}

/// A type that can be stored in a collection.
///
/// `Entity` is the per-type descriptor the engine uses to stamp the reserved
/// fields and to decide which fields are indexed. The engine always writes `id`,
/// `createdAt` and `updatedAt` into the stored document; the setters only mirror
/// those values back into the caller's object, so types without timestamp fields
/// can keep the default no-op implementations.
///
/// # Examples
///
/// ```rust,ignore
/// #[derive(Serialize, Deserialize, Default)]
/// struct User {
///     #[serde(default)]
///     id: String,
///     name: String,
///     email: String,
///     age: u32,
/// }
///
/// impl Entity for User {
///     fn id(&self) -> Option<String> {
///         Some(self.id.clone()).filter(|id| !id.is_empty())
///     }
///
///     fn set_id(&mut self, id: String) {
///         self.id = id;
///     }
///
///     fn index_fields() -> IndexFields {
///         IndexFields::Declared(&["name", "email"])
///     }
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + 'static {
    /// Returns the identifier, or `None` if the entity was never stored.
    fn id(&self) -> Option<String>;

    fn set_id(&mut self, id: String);

    fn set_created_at(&mut self, _at: DateTime<Utc>) {}

    fn set_updated_at(&mut self, _at: DateTime<Utc>) {}

    /// Fields eligible for secondary indexes. Defaults to every string field.
    fn index_fields() -> IndexFields
    where
        Self: Sized,
    {
        IndexFields::Discover
    }
}

impl Entity for Document {
    fn id(&self) -> Option<String> {
        Document::id(self).map(str::to_string)
    }

    fn set_id(&mut self, id: String) {
        self.put_field(DOC_ID.to_string(), Value::from(id));
    }

    fn set_created_at(&mut self, at: DateTime<Utc>) {
        self.put_field(DOC_CREATED_AT.to_string(), Value::from(at));
    }

    fn set_updated_at(&mut self, at: DateTime<Utc>) {
        self.put_field(DOC_UPDATED_AT.to_string(), Value::from(at));
    }
}

/// Converts an entity into the document that gets stored.
pub(crate) fn to_document<T: Entity>(entity: &T) -> KvDocResult<Document> {
    let json = serde_json::to_value(entity)?;
    serde_json::from_value(json).map_err(|err| {
        log::error!(
            "Entity of type {} does not serialize to an object: {}",
            type_name::<T>(),
            err
        );
        KvDocError::from(err)
    })
}

/// Decodes stored bytes into an entity.
pub(crate) fn from_bytes<T: Entity>(bytes: &[u8]) -> KvDocResult<T> {
    serde_json::from_slice(bytes).map_err(|err| {
        log::error!(
            "Failed to decode stored document as {}: {}",
            type_name::<T>(),
            err
        );
        KvDocError::from(err)
    })
}

/// Index field list resolved for one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum IndexMeta {
    Declared(Vec<String>),
    Discover,
}

impl IndexMeta {
    /// Names of the fields of `doc` to maintain indexes for.
    pub(crate) fn fields_of(&self, doc: &Document) -> Vec<String> {
        match self {
            IndexMeta::Declared(fields) => fields.clone(),
            IndexMeta::Discover => doc
                .string_fields()
                .into_iter()
                .filter(|f| !is_id_field(f) && !RESERVED_FIELDS.contains(&f.as_str()))
                .collect(),
        }
    }
}

/// Per-type cache of resolved index metadata.
///
/// Populated lazily the first time a type is stored and never invalidated.
#[derive(Default)]
pub(crate) struct IndexMetaCache {
    entries: Mutex<HashMap<TypeId, Arc<IndexMeta>>>,
}

impl IndexMetaCache {
    pub(crate) fn new() -> IndexMetaCache {
        IndexMetaCache::default()
    }

    pub(crate) fn resolve<T: Entity>(&self) -> Arc<IndexMeta> {
        let mut entries = self.entries.lock();
        entries
            .entry(TypeId::of::<T>())
            .or_insert_with(|| {
                let meta = match T::index_fields() {
                    IndexFields::Declared(fields) => IndexMeta::Declared(
                        fields
                            .iter()
                            .filter(|f| {
                                !f.is_empty() && !is_id_field(f) && !RESERVED_FIELDS.contains(*f)
                            })
                            .map(|f| f.to_string())
                            .collect(),
                    ),
                    IndexFields::Discover => IndexMeta::Discover,
                };
                log::debug!("Resolved index fields for {}: {:?}", type_name::<T>(), meta);
                Arc::new(meta)
            })
            .clone()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
