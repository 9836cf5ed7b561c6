use crate::doc_store::DocStore;
use crate::doc_store_config::DocStoreConfig;
use crate::errors::{KvDocError, KvDocResult};
use crate::store::KvStore;
use std::sync::Arc;

/// Builder for opening a [DocStore].
///
/// Configuration errors are captured while chaining and returned from
/// [DocStoreBuilder::open].
///
/// # Examples
///
/// ```rust,ignore
/// use kvdoc::store::memory::InMemoryStore;
/// use kvdoc::DocStore;
///
/// let store = DocStore::builder()
///     .kv_store(InMemoryStore::new())
///     .log_operations(true)
///     .index_prefix("ix_")
///     .open()?;
/// ```
#[derive(Default)]
pub struct DocStoreBuilder {
    error: Option<KvDocError>,
    config: DocStoreConfig,
}

impl DocStoreBuilder {
    pub fn new() -> Self {
        DocStoreBuilder::default()
    }

    /// Sets the key-value store documents are kept in. Required.
    pub fn kv_store<S: KvStore + 'static>(self, store: S) -> Self {
        self.shared_kv_store(Arc::new(store))
    }

    /// Same as [DocStoreBuilder::kv_store] for a store that is already shared.
    pub fn shared_kv_store(mut self, store: Arc<dyn KvStore>) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_kv_store(store) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Logs every primitive call of the key-value store at debug level.
    pub fn log_operations(mut self, enabled: bool) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_log_operations(enabled) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Sets the prefix of index bucket names. Must not be empty.
    pub fn index_prefix(mut self, prefix: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_index_prefix(prefix) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Opens the store.
    ///
    /// # Errors
    ///
    /// Returns the first error captured while configuring, or `InvalidOperation`
    /// when no key-value store was supplied.
    pub fn open(self) -> KvDocResult<DocStore> {
        if let Some(err) = self.error {
            return Err(err);
        }
        DocStore::open(self.config)
    }
}
