use crate::collection::Document;
use crate::common::{is_id_field, RESERVED_FIELDS};
use crate::errors::KvDocResult;
use crate::index::{decode_ids, encode_ids, IdSet};
use crate::store::{KvBucket, KvTransaction};
use std::collections::{BTreeMap, BTreeSet};

/// Maintains the secondary indexes of one collection.
///
/// Every indexed field has its own bucket named `<prefix><collection>_<field>`.
/// An entry maps a field value to the set of ids of the documents currently
/// holding that value. Only non-empty strings are indexed. All maintenance runs
/// inside the caller's write transaction, so a failed write leaves no partial
/// index update behind.
///
/// The writer's field list only decides which buckets get created. Once a bucket
/// exists it covers every document of the collection, whatever type wrote it: a
/// new bucket is filled from the stored documents, and every later write keeps
/// it current.
#[derive(Debug, Clone)]
pub(crate) struct CollectionIndex {
    collection: String,
    prefix: String,
}

impl CollectionIndex {
    pub(crate) fn new(collection: &str, prefix: &str) -> CollectionIndex {
        CollectionIndex {
            collection: collection.to_string(),
            prefix: prefix.to_string(),
        }
    }

    pub(crate) fn bucket_name(&self, field: &str) -> String {
        format!("{}{}_{}", self.prefix, self.collection, field)
    }

    /// Returns the index bucket of `field`, if one exists.
    pub(crate) fn bucket(
        &self,
        tx: &dyn KvTransaction,
        field: &str,
    ) -> KvDocResult<Option<Box<dyn KvBucket>>> {
        tx.bucket(&self.bucket_name(field), false)
    }

    /// Returns the ids stored under `value` for `field`, or `None` when the field
    /// has no index bucket.
    pub(crate) fn lookup(
        &self,
        tx: &dyn KvTransaction,
        field: &str,
        value: &str,
    ) -> KvDocResult<Option<IdSet>> {
        let Some(bucket) = self.bucket(tx, field)? else {
            return Ok(None);
        };
        match bucket.get(value.as_bytes())? {
            Some(bytes) => Ok(Some(decode_ids(&bytes)?)),
            None => Ok(Some(IdSet::new())),
        }
    }

    /// Indexes a newly inserted document under each of `fields` and under every
    /// existing index bucket its string fields match.
    pub(crate) fn on_insert(
        &self,
        tx: &dyn KvTransaction,
        id: &str,
        fields: &[String],
        doc: &Document,
    ) -> KvDocResult<()> {
        let fields = self.fields_to_index(tx, fields, doc)?;
        for (field, value) in indexable_values(&fields, doc) {
            self.add_id(tx, field, value, id)?;
        }
        Ok(())
    }

    /// Moves the document's index entries from its previous stored values to its
    /// new values.
    ///
    /// Entries are removed for every string field of `old`, not only for `fields`,
    /// so an entry can never survive a change of the field it was built from.
    pub(crate) fn on_update(
        &self,
        tx: &dyn KvTransaction,
        id: &str,
        fields: &[String],
        old: &Document,
        new: &Document,
    ) -> KvDocResult<()> {
        let fields = self.fields_to_index(tx, fields, new)?;
        let wanted = indexable_values(&fields, new);

        let old_fields: Vec<String> = old.string_fields().into_iter().collect();
        for (field, previous) in indexable_values(&old_fields, old) {
            if wanted.get(field) == Some(&previous) {
                continue;
            }
            self.remove_id(tx, field, previous, id)?;
        }

        for (field, value) in wanted {
            self.add_id(tx, field, value, id)?;
        }
        Ok(())
    }

    /// Removes a deleted document from the index entry of each of its string
    /// fields.
    pub(crate) fn on_delete(&self, tx: &dyn KvTransaction, id: &str, old: &Document) -> KvDocResult<()> {
        let old_fields: Vec<String> = old.string_fields().into_iter().collect();
        for (field, previous) in indexable_values(&old_fields, old) {
            self.remove_id(tx, field, previous, id)?;
        }
        Ok(())
    }

    /// `fields` plus every other application string field of `doc` that already
    /// has an index bucket.
    fn fields_to_index(
        &self,
        tx: &dyn KvTransaction,
        fields: &[String],
        doc: &Document,
    ) -> KvDocResult<Vec<String>> {
        let mut all: BTreeSet<String> = fields.iter().cloned().collect();
        for field in doc.string_fields() {
            if all.contains(&field) || is_id_field(&field) || RESERVED_FIELDS.contains(&field.as_str()) {
                continue;
            }
            if self.bucket(tx, &field)?.is_some() {
                all.insert(field);
            }
        }
        Ok(all.into_iter().collect())
    }

    fn add_id(&self, tx: &dyn KvTransaction, field: &str, value: &str, id: &str) -> KvDocResult<()> {
        let name = self.bucket_name(field);
        let bucket = match tx.bucket(&name, false)? {
            Some(bucket) => bucket,
            None => {
                let Some(bucket) = tx.bucket(&name, true)? else {
                    return Ok(());
                };
                self.backfill(tx, bucket.as_ref(), field)?;
                bucket
            }
        };
        let key = value.as_bytes();
        let mut ids = match bucket.get(key)? {
            Some(bytes) => decode_ids(&bytes)?,
            None => IdSet::new(),
        };
        if ids.insert(id.to_string()) {
            bucket.set(key, &encode_ids(&ids))?;
        }
        Ok(())
    }

    /// Fills a freshly created bucket for `field` from the documents already in
    /// the primary bucket.
    fn backfill(&self, tx: &dyn KvTransaction, bucket: &dyn KvBucket, field: &str) -> KvDocResult<()> {
        let Some(primary) = tx.bucket(&self.collection, false)? else {
            return Ok(());
        };

        let mut entries: BTreeMap<String, IdSet> = BTreeMap::new();
        let mut cursor = primary.cursor()?;
        let mut entry = cursor.first()?;
        while let Some((key, bytes)) = entry {
            let doc = Document::from_bytes(&bytes)?;
            if let Some(value) = doc.get_str(field).filter(|value| !value.is_empty()) {
                entries
                    .entry(value.to_string())
                    .or_default()
                    .insert(String::from_utf8(key)?);
            }
            entry = cursor.next()?;
        }

        if !entries.is_empty() {
            log::debug!(
                "Backfilled index {} with {} values",
                self.bucket_name(field),
                entries.len()
            );
        }
        for (value, ids) in entries {
            bucket.set(value.as_bytes(), &encode_ids(&ids))?;
        }
        Ok(())
    }

    fn remove_id(&self, tx: &dyn KvTransaction, field: &str, value: &str, id: &str) -> KvDocResult<()> {
        let Some(bucket) = self.bucket(tx, field)? else {
            return Ok(());
        };
        let key = value.as_bytes();
        let Some(bytes) = bucket.get(key)? else {
            return Ok(());
        };
        let mut ids = decode_ids(&bytes)?;
        if !ids.remove(id) {
            return Ok(());
        }
        if ids.is_empty() {
            bucket.delete(key)
        } else {
            bucket.set(key, &encode_ids(&ids))
        }
    }
}

/// Field name to value for every field of `fields` holding a non-empty string.
fn indexable_values<'a>(fields: &'a [String], doc: &'a Document) -> BTreeMap<&'a str, &'a str> {
    fields
        .iter()
        .filter(|field| !is_id_field(field))
        .filter_map(|field| {
            doc.get_str(field)
                .filter(|value| !value.is_empty())
                .map(|value| (field.as_str(), value))
        })
        .collect()
}
