//! Configuration management for the document store.

use crate::common::DEFAULT_INDEX_PREFIX;
use crate::errors::{ErrorKind, KvDocError, KvDocResult};
use crate::store::{KvStore, LoggingStore};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Settings of a [DocStore](crate::DocStore).
///
/// Cheap to clone; clones share the same settings. Every setter fails with
/// `InvalidOperation` once the store using the configuration has been opened.
///
/// # Examples
///
/// ```rust,ignore
/// use kvdoc::DocStore;
///
/// let store = DocStore::builder()
///     .kv_store(InMemoryStore::new())
///     .log_operations(true)
///     .index_prefix("ix_")
///     .open()?;
/// assert_eq!(store.config().index_prefix(), "ix_");
/// ```
#[derive(Clone)]
pub struct DocStoreConfig {
    inner: Arc<DocStoreConfigInner>,
}

impl Default for DocStoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DocStoreConfig {
    /// Creates a configuration with the default settings: operation logging off
    /// and index prefix `idx_`.
    pub fn new() -> Self {
        DocStoreConfig {
            inner: Arc::new(DocStoreConfigInner::new()),
        }
    }

    /// Returns true if every primitive call is logged at debug level.
    pub fn log_operations(&self) -> bool {
        self.inner.log_operations.load(Ordering::Relaxed)
    }

    pub fn set_log_operations(&self, enabled: bool) -> KvDocResult<()> {
        self.inner.ensure_not_configured("log_operations")?;
        self.inner.log_operations.store(enabled, Ordering::Relaxed);
        Ok(())
    }

    /// Prefix of index bucket names: `<prefix><collection>_<field>`.
    pub fn index_prefix(&self) -> String {
        self.inner.index_prefix.read().clone()
    }

    /// Sets the index bucket prefix.
    ///
    /// # Errors
    ///
    /// Returns error if already configured or if the prefix is empty.
    pub fn set_index_prefix(&self, prefix: &str) -> KvDocResult<()> {
        self.inner.ensure_not_configured("index_prefix")?;
        if prefix.is_empty() {
            log::error!("Index prefix cannot be empty");
            return Err(KvDocError::new(
                "Index prefix cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }
        *self.inner.index_prefix.write() = prefix.to_string();
        Ok(())
    }

    /// Sets the key-value store documents are kept in. Can only be set once.
    pub fn set_kv_store(&self, store: Arc<dyn KvStore>) -> KvDocResult<()> {
        self.inner.ensure_not_configured("kv_store")?;
        if self.inner.kv_store.set(store).is_err() {
            log::error!("Key-value store is already set");
            return Err(KvDocError::new(
                "Key-value store is already set",
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.inner.configured.load(Ordering::Acquire)
    }

    /// Freezes the configuration and returns the store to use, wrapped in a
    /// [LoggingStore] when operation logging is enabled.
    pub(crate) fn initialize(&self) -> KvDocResult<Arc<dyn KvStore>> {
        let store = match self.inner.kv_store.get() {
            Some(store) => store.clone(),
            None => {
                log::error!("No key-value store is configured");
                return Err(KvDocError::new(
                    "No key-value store is configured",
                    ErrorKind::InvalidOperation,
                ));
            }
        };

        if self
            .inner
            .configured
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::error!("Configuration is already used by an open store");
            return Err(KvDocError::new(
                "Configuration is already used by an open store",
                ErrorKind::InvalidOperation,
            ));
        }

        if self.log_operations() {
            log::debug!("Logging every key-value operation");
            Ok(Arc::new(LoggingStore::new(store)))
        } else {
            Ok(store)
        }
    }
}

struct DocStoreConfigInner {
    configured: AtomicBool,
    log_operations: AtomicBool,
    index_prefix: RwLock<String>,
    kv_store: OnceLock<Arc<dyn KvStore>>,
}

impl DocStoreConfigInner {
    fn new() -> Self {
        DocStoreConfigInner {
            configured: AtomicBool::new(false),
            log_operations: AtomicBool::new(false),
            index_prefix: RwLock::new(DEFAULT_INDEX_PREFIX.to_string()),
            kv_store: OnceLock::new(),
        }
    }

    fn ensure_not_configured(&self, setting: &str) -> KvDocResult<()> {
        if self.configured.load(Ordering::Acquire) {
            log::error!("{} cannot be changed after the store is opened", setting);
            return Err(KvDocError::new(
                &format!("{} cannot be changed after the store is opened", setting),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }
}
