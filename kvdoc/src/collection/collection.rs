use crate::collection::entity::{from_bytes, to_document};
use crate::collection::view::select;
use crate::collection::{Document, Entity, Selector, View};
use crate::doc_store::DocStore;
use crate::errors::{ErrorKind, KvDocError, KvDocResult};
use crate::filter::Filter;
use crate::index::CollectionIndex;
use crate::store::{KvBucket, KvTransaction};
use crate::stream::KvIter;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A named set of documents inside a [DocStore].
///
/// Documents live in the primary bucket named after the collection, keyed by
/// their engine-assigned id. String fields are indexed in secondary buckets that
/// are kept in step with every insert, update and delete inside the same write
/// transaction.
///
/// `Collection` is cheap to clone. Clones refer to the same documents.
///
/// # Examples
///
/// ```rust,ignore
/// let users = store.collection("users")?;
/// let mut batch = [doc!{ name: "bob", age: 20 }, doc!{ name: "rob", age: 25 }];
/// let ids = users.insert(&mut batch)?;
///
/// let mut bob: Document = users.get(&ids[0])?;
/// bob.put("age", 21)?;
/// users.update(&ids[0], &mut bob)?;
///
/// users.delete(field("name").eq("rob"))?;
/// ```
#[derive(Clone)]
pub struct Collection {
    inner: Arc<CollectionInner>,
}

struct CollectionInner {
    name: String,
    store: DocStore,
    index: CollectionIndex,
}

impl Collection {
    pub(crate) fn new(name: &str, store: DocStore) -> Collection {
        let index = CollectionIndex::new(name, &store.config().index_prefix());
        Collection {
            inner: Arc::new(CollectionInner {
                name: name.to_string(),
                store,
                index,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the number of documents in the collection.
    pub fn count(&self) -> KvDocResult<usize> {
        self.find_all().count()
    }

    /// Inserts a batch of entities in one write transaction.
    ///
    /// Every entity gets a new id from the collection's sequence and equal
    /// creation and update timestamps, written back into the caller's values.
    /// If any entity fails, nothing of the batch is stored.
    ///
    /// # Arguments
    /// * `entities` - The entities to insert
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - The assigned ids, in batch order
    /// * `Err(KvDocError)` - If encoding or storing any entity fails
    pub fn insert<T: Entity>(&self, entities: &mut [T]) -> KvDocResult<Vec<String>> {
        let meta = self.inner.store.index_meta::<T>();

        self.write("insert", |tx| {
            let now = self.inner.store.now();
            let bucket = self.primary_bucket(tx)?;
            let mut ids = Vec::with_capacity(entities.len());
            for entity in entities.iter_mut() {
                let id = bucket.next_sequence()?.to_string();
                let doc = stamp(entity, &id, now, now)?;
                bucket.set(id.as_bytes(), &doc.to_bytes()?)?;
                self.inner
                    .index
                    .on_insert(tx, &id, &meta.fields_of(&doc), &doc)?;
                ids.push(id);
            }
            log::debug!("Inserted {} documents into {}", ids.len(), self.name());
            Ok(ids)
        })
    }

    /// Returns the document stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no such document.
    pub fn get<T: Entity>(&self, id: &str) -> KvDocResult<T> {
        self.read("get", |tx| {
            let bucket = self.primary_bucket(tx)?;
            let Some(bytes) = bucket.get(id.as_bytes())? else {
                return Err(self.missing_document(id));
            };
            let mut entity: T = from_bytes(&bytes)?;
            entity.set_id(id.to_string());
            Ok(entity)
        })
    }

    /// Returns every document of the collection in id order.
    pub fn get_all<T: Entity>(&self) -> KvDocResult<Vec<T>> {
        self.find_all().all()
    }

    /// Returns a view of the documents matching every filter of `filters`.
    pub fn find(&self, filters: impl IntoIterator<Item = Filter>) -> View {
        View::new(self.clone(), filters.into_iter().collect())
    }

    /// Returns a view of every document.
    pub fn find_all(&self) -> View {
        View::new(self.clone(), Vec::new())
    }

    /// Replaces one document with `entity`.
    ///
    /// An id selector targets that document directly; a filter selector targets
    /// the first match in id order. The stored creation timestamp is kept and the
    /// update timestamp refreshed, both written back into `entity`. Indexes are
    /// reconciled against the previously stored document.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if nothing matches the selector, and
    /// `InvalidOperation` for [Selector::All].
    pub fn update<T: Entity>(&self, selector: impl Into<Selector>, entity: &mut T) -> KvDocResult<()> {
        let selector = selector.into();
        let meta = self.inner.store.index_meta::<T>();

        self.write("update", |tx| {
            let now = self.inner.store.now();
            let id = match selector {
                Selector::Id(id) => id,
                Selector::Filter(filter) => {
                    let mut iter = select(self, tx, &[filter], Arc::new([]), 0, 1)?;
                    if !iter.next()? {
                        log::error!("No document in {} matches the update filter", self.name());
                        return Err(KvDocError::new(
                            &format!("No document in {} matches the update filter", self.name()),
                            ErrorKind::NotFound,
                        ));
                    }
                    String::from_utf8(iter.key().to_vec())?
                }
                Selector::All => {
                    log::error!("Update needs an id or a filter selector");
                    return Err(KvDocError::new(
                        "Update needs an id or a filter selector",
                        ErrorKind::InvalidOperation,
                    ));
                }
            };

            let bucket = self.primary_bucket(tx)?;
            let Some(bytes) = bucket.get(id.as_bytes())? else {
                return Err(self.missing_document(&id));
            };
            let old = Document::from_bytes(&bytes)?;

            let created = old.created_at().unwrap_or(now);
            let doc = stamp(entity, &id, created, now)?;
            bucket.set(id.as_bytes(), &doc.to_bytes()?)?;
            self.inner
                .index
                .on_update(tx, &id, &meta.fields_of(&doc), &old, &doc)?;
            log::debug!("Updated document {} in {}", id, self.name());
            Ok(())
        })
    }

    /// Deletes the documents targeted by `selector`.
    ///
    /// # Returns
    /// * `Ok(usize)` - The number of deleted documents. A filter or
    ///   [Selector::All] matching nothing deletes nothing and returns 0.
    /// * `Err(KvDocError)` - `NotFound` for an id selector naming a missing
    ///   document, or any storage error; nothing is deleted then.
    pub fn delete(&self, selector: impl Into<Selector>) -> KvDocResult<usize> {
        let selector = selector.into();

        self.write("delete", |tx| {
            let (ids, must_exist) = match selector {
                Selector::Id(id) => (vec![id], true),
                Selector::Filter(filter) => (self.matching_ids(tx, &[filter])?, false),
                Selector::All => (self.matching_ids(tx, &[])?, false),
            };

            let bucket = self.primary_bucket(tx)?;
            let mut deleted = 0;
            for id in ids {
                let Some(bytes) = bucket.get(id.as_bytes())? else {
                    if must_exist {
                        return Err(self.missing_document(&id));
                    }
                    continue;
                };
                let old = Document::from_bytes(&bytes)?;
                bucket.delete(id.as_bytes())?;
                self.inner.index.on_delete(tx, &id, &old)?;
                deleted += 1;
            }
            log::debug!("Deleted {} documents from {}", deleted, self.name());
            Ok(deleted)
        })
    }

    pub(crate) fn store(&self) -> &DocStore {
        &self.inner.store
    }

    pub(crate) fn index(&self) -> &CollectionIndex {
        &self.inner.index
    }

    /// Returns the primary bucket of the collection inside `tx`.
    pub(crate) fn primary_bucket(&self, tx: &dyn KvTransaction) -> KvDocResult<Box<dyn KvBucket>> {
        match tx.bucket(self.name(), false)? {
            Some(bucket) => Ok(bucket),
            None => {
                log::error!("Collection {} does not exist", self.name());
                Err(KvDocError::new(
                    &format!("Collection {} does not exist", self.name()),
                    ErrorKind::NotFound,
                ))
            }
        }
    }

    fn matching_ids(&self, tx: &dyn KvTransaction, filters: &[Filter]) -> KvDocResult<Vec<String>> {
        let mut iter = select(self, tx, filters, Arc::new([]), 0, 0)?;
        let mut ids = Vec::new();
        while iter.next()? {
            ids.push(String::from_utf8(iter.key().to_vec())?);
        }
        Ok(ids)
    }

    fn missing_document(&self, id: &str) -> KvDocError {
        log::error!("Document {} not found in {}", id, self.name());
        KvDocError::new(
            &format!("Document {} not found in {}", id, self.name()),
            ErrorKind::NotFound,
        )
    }

    fn write<R>(
        &self,
        operation: &str,
        work: impl FnOnce(&dyn KvTransaction) -> KvDocResult<R>,
    ) -> KvDocResult<R> {
        self.run(true, operation, work)
    }

    fn read<R>(
        &self,
        operation: &str,
        work: impl FnOnce(&dyn KvTransaction) -> KvDocResult<R>,
    ) -> KvDocResult<R> {
        self.run(false, operation, work)
    }

    fn run<R>(
        &self,
        writable: bool,
        operation: &str,
        work: impl FnOnce(&dyn KvTransaction) -> KvDocResult<R>,
    ) -> KvDocResult<R> {
        let tx = self
            .inner
            .store
            .begin(writable)
            .map_err(|e| e.in_operation(operation))?;

        let result = work(tx.as_ref()).and_then(|value| tx.commit().map(|_| value));
        if result.is_err() {
            if let Err(rollback) = tx.rollback() {
                log::warn!("Rollback of {} on {} failed: {}", operation, self.name(), rollback);
            }
        }
        result.map_err(|e| e.in_operation(operation))
    }
}

/// Writes the engine-owned fields into `entity` and returns the document to
/// store for it.
fn stamp<T: Entity>(
    entity: &mut T,
    id: &str,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
) -> KvDocResult<Document> {
    entity.set_id(id.to_string());
    entity.set_created_at(created);
    entity.set_updated_at(updated);

    let mut doc = to_document(entity)?;
    Entity::set_id(&mut doc, id.to_string());
    Entity::set_created_at(&mut doc, created);
    Entity::set_updated_at(&mut doc, updated);
    Ok(doc)
}
