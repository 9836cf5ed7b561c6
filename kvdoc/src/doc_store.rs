use crate::collection::{Collection, Entity, IndexMeta, IndexMetaCache};
use crate::doc_store_builder::DocStoreBuilder;
use crate::doc_store_config::DocStoreConfig;
use crate::errors::{ErrorKind, KvDocError, KvDocResult};
use crate::store::memory::InMemoryStore;
use crate::store::{KvStore, KvTransaction};
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// A document store layered over an ordered key-value store.
///
/// `DocStore` is the entry point of the engine: it hands out [Collection]s, owns
/// the per-type index metadata cache and the clock used to stamp documents.
/// Clones share the same state and may be used from several threads.
///
/// # Examples
///
/// ```rust,ignore
/// use kvdoc::{doc, DocStore};
/// use kvdoc::filter::field;
///
/// let store = DocStore::in_memory()?;
/// let users = store.collection("users")?;
///
/// let mut docs = [doc!{ name: "bob", age: 20 }];
/// users.insert(&mut docs)?;
///
/// let bob = users.find([field("name").eq("bob")]).one::<Document>()?;
/// store.close()?;
/// ```
#[derive(Clone)]
pub struct DocStore {
    inner: Arc<DocStoreInner>,
}

impl DocStore {
    /// Creates a [DocStoreBuilder].
    pub fn builder() -> DocStoreBuilder {
        DocStoreBuilder::new()
    }

    /// Opens a store over a fresh [InMemoryStore] with default settings.
    pub fn in_memory() -> KvDocResult<DocStore> {
        DocStore::builder().kv_store(InMemoryStore::new()).open()
    }

    pub(crate) fn open(config: DocStoreConfig) -> KvDocResult<DocStore> {
        let kv = config.initialize()?;
        log::debug!(
            "Opened document store with index prefix {}",
            config.index_prefix()
        );
        Ok(DocStore {
            inner: Arc::new(DocStoreInner {
                kv,
                config,
                meta_cache: IndexMetaCache::new(),
                clock: Mutex::new(DateTime::<Utc>::MIN_UTC),
            }),
        })
    }

    /// Returns the collection `name`, creating its primary bucket if needed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the name is empty or starts with the index
    /// prefix, or the key-value store error if the bucket cannot be created.
    pub fn collection(&self, name: &str) -> KvDocResult<Collection> {
        self.inner.validate_collection_name(name)?;

        let tx = self
            .begin(true)
            .map_err(|e| e.in_operation("collection"))?;
        let created = tx.bucket(name, true).and_then(|_| tx.commit());
        if let Err(err) = created {
            if let Err(rollback) = tx.rollback() {
                log::warn!("Rollback after failed collection creation failed: {}", rollback);
            }
            return Err(err.in_operation("collection"));
        }

        Ok(Collection::new(name, self.clone()))
    }

    pub fn config(&self) -> &DocStoreConfig {
        &self.inner.config
    }

    /// Closes the underlying key-value store.
    pub fn close(&self) -> KvDocResult<()> {
        log::debug!("Closing document store");
        self.inner.kv.close()
    }

    pub(crate) fn begin(&self, writable: bool) -> KvDocResult<Box<dyn KvTransaction>> {
        self.inner.kv.begin(writable)
    }

    pub(crate) fn index_meta<T: Entity>(&self) -> Arc<IndexMeta> {
        self.inner.meta_cache.resolve::<T>()
    }

    /// Returns a timestamp strictly later than any previously returned by this
    /// store.
    pub(crate) fn now(&self) -> DateTime<Utc> {
        let mut last = self.inner.clock.lock();
        let now = Utc::now();
        let next = if now > *last {
            now
        } else {
            *last + TimeDelta::microseconds(1)
        };
        *last = next;
        next
    }
}

struct DocStoreInner {
    kv: Arc<dyn KvStore>,
    config: DocStoreConfig,
    meta_cache: IndexMetaCache,
    clock: Mutex<DateTime<Utc>>,
}

impl DocStoreInner {
    fn validate_collection_name(&self, name: &str) -> KvDocResult<()> {
        if name.is_empty() {
            log::error!("Collection name cannot be empty");
            return Err(KvDocError::new(
                "Collection name cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }
        if name.starts_with(&self.config.index_prefix()) {
            log::error!("Collection name {} collides with index buckets", name);
            return Err(KvDocError::new(
                &format!("Collection name {} cannot start with the index prefix", name),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }
}
