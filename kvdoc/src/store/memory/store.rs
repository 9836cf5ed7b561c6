use crate::errors::{ErrorKind, KvDocError, KvDocResult};
use crate::store::{KvBucket, KvCursor, KvEntry, KvStore, KvTransaction};
use im::OrdMap;
use parking_lot::{Condvar, Mutex, RwLock};
use std::ops::Bound::{Excluded, Unbounded};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
struct MemBucket {
    entries: OrdMap<Vec<u8>, Vec<u8>>,
    sequence: u64,
}

type Buckets = OrdMap<String, MemBucket>;

/// In-memory implementation of the ordered key-value primitive.
///
/// # Purpose
/// `InMemoryStore` backs the document engine when no persistent storage is
/// needed: unit and integration tests, caches and scratch collections.
///
/// # Characteristics
/// - **Snapshot Reads**: a read transaction captures the committed state in O(1)
///   (persistent `im::OrdMap`) and never observes later commits
/// - **Serialized Writers**: one write transaction at a time; a second writer
///   blocks in `begin` until the first commits or rolls back
/// - **Atomic Commit**: a write transaction works on a private copy that is
///   published as a whole on commit and discarded on rollback or drop
/// - **Live Cursors**: a cursor continues strictly after the last key it returned,
///   so deleting the current key while iterating is safe
///
/// # Usage
/// ```text
/// let store = InMemoryStore::new();
/// let tx = store.begin(true)?;
/// let bucket = tx.bucket("users", true)?.unwrap();
/// bucket.set(b"1", b"{}")?;
/// tx.commit()?;
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<InMemoryStoreInner>,
}

impl InMemoryStore {
    pub fn new() -> InMemoryStore {
        InMemoryStore::default()
    }

    /// Returns true once [KvStore::close] has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Names of all committed buckets, in ascending order.
    pub fn bucket_names(&self) -> Vec<String> {
        self.inner.committed.read().keys().cloned().collect()
    }
}

impl KvStore for InMemoryStore {
    fn begin(&self, writable: bool) -> KvDocResult<Box<dyn KvTransaction>> {
        self.inner.begin(writable)
    }

    fn close(&self) -> KvDocResult<()> {
        self.inner.closed.store(true, Ordering::Release);
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryStoreInner {
    committed: RwLock<Buckets>,
    writer: Arc<WriterGate>,
    closed: AtomicBool,
}

impl InMemoryStoreInner {
    fn begin(self: &Arc<Self>, writable: bool) -> KvDocResult<Box<dyn KvTransaction>> {
        if self.closed.load(Ordering::Acquire) {
            log::error!("Cannot begin a transaction on a closed in-memory store");
            return Err(KvDocError::new(
                "Store is closed",
                ErrorKind::InvalidOperation,
            ));
        }

        // the permit is taken before the snapshot so a writer always starts from
        // the latest committed state
        let permit = if writable {
            Some(self.writer.acquire())
        } else {
            None
        };
        let buckets = self.committed.read().clone();

        Ok(Box::new(MemTransaction {
            store: self.clone(),
            state: Arc::new(Mutex::new(TxState {
                writable,
                finished: false,
                buckets,
                permit,
            })),
        }))
    }
}

#[derive(Default)]
struct WriterGate {
    busy: Mutex<bool>,
    released: Condvar,
}

impl WriterGate {
    fn acquire(self: &Arc<Self>) -> WriterPermit {
        let mut busy = self.busy.lock();
        while *busy {
            self.released.wait(&mut busy);
        }
        *busy = true;
        WriterPermit { gate: self.clone() }
    }
}

struct WriterPermit {
    gate: Arc<WriterGate>,
}

impl Drop for WriterPermit {
    fn drop(&mut self) {
        *self.gate.busy.lock() = false;
        self.gate.released.notify_one();
    }
}

struct TxState {
    writable: bool,
    finished: bool,
    buckets: Buckets,
    permit: Option<WriterPermit>,
}

impl TxState {
    fn ensure_open(&self) -> KvDocResult<()> {
        if self.finished {
            log::error!("In-memory transaction used after it finished");
            return Err(KvDocError::new(
                "Transaction is closed",
                ErrorKind::TransactionClosed,
            ));
        }
        Ok(())
    }

    fn ensure_writable(&self) -> KvDocResult<()> {
        self.ensure_open()?;
        if !self.writable {
            log::error!("Write attempted on a read-only in-memory transaction");
            return Err(KvDocError::new(
                "Transaction is read-only",
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }

    fn bucket(&self, name: &str) -> KvDocResult<&MemBucket> {
        self.buckets.get(name).ok_or_else(|| missing_bucket(name))
    }

    fn bucket_mut(&mut self, name: &str) -> KvDocResult<&mut MemBucket> {
        self.buckets.get_mut(name).ok_or_else(|| missing_bucket(name))
    }

    fn finish(&mut self) {
        self.finished = true;
        self.buckets = Buckets::new();
        self.permit = None;
    }
}

fn missing_bucket(name: &str) -> KvDocError {
    log::error!("Bucket {} does not exist in this transaction", name);
    KvDocError::new(
        &format!("Bucket {} does not exist", name),
        ErrorKind::NotFound,
    )
}

struct MemTransaction {
    store: Arc<InMemoryStoreInner>,
    state: Arc<Mutex<TxState>>,
}

impl KvTransaction for MemTransaction {
    fn is_writable(&self) -> bool {
        self.state.lock().writable
    }

    fn bucket(
        &self,
        name: &str,
        create_if_missing: bool,
    ) -> KvDocResult<Option<Box<dyn KvBucket>>> {
        if name.is_empty() {
            log::error!("Bucket name cannot be empty");
            return Err(KvDocError::new(
                "Bucket name cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }

        let mut state = self.state.lock();
        state.ensure_open()?;
        if !state.buckets.contains_key(name) {
            if !create_if_missing {
                return Ok(None);
            }
            state.ensure_writable()?;
            state.buckets.insert(name.to_string(), MemBucket::default());
        }

        Ok(Some(Box::new(MemBucketHandle {
            name: name.to_string(),
            state: self.state.clone(),
        })))
    }

    fn commit(&self) -> KvDocResult<()> {
        let mut state = self.state.lock();
        if state.finished {
            return Ok(());
        }
        if state.writable {
            let buckets = std::mem::take(&mut state.buckets);
            *self.store.committed.write() = buckets;
        }
        state.finish();
        Ok(())
    }

    fn rollback(&self) -> KvDocResult<()> {
        let mut state = self.state.lock();
        if !state.finished {
            state.finish();
        }
        Ok(())
    }
}

impl Drop for MemTransaction {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if !state.finished {
            state.finish();
        }
    }
}

struct MemBucketHandle {
    name: String,
    state: Arc<Mutex<TxState>>,
}

impl KvBucket for MemBucketHandle {
    fn get(&self, key: &[u8]) -> KvDocResult<Option<Vec<u8>>> {
        let state = self.state.lock();
        state.ensure_open()?;
        Ok(state.bucket(&self.name)?.entries.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> KvDocResult<()> {
        if key.is_empty() {
            log::error!("Key cannot be empty in bucket {}", self.name);
            return Err(KvDocError::new(
                "Key cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }

        let mut state = self.state.lock();
        state.ensure_writable()?;
        state
            .bucket_mut(&self.name)?
            .entries
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> KvDocResult<()> {
        let mut state = self.state.lock();
        state.ensure_writable()?;
        state.bucket_mut(&self.name)?.entries.remove(key);
        Ok(())
    }

    fn next_sequence(&self) -> KvDocResult<u64> {
        let mut state = self.state.lock();
        state.ensure_writable()?;
        let bucket = state.bucket_mut(&self.name)?;
        bucket.sequence += 1;
        Ok(bucket.sequence)
    }

    fn cursor(&self) -> KvDocResult<Box<dyn KvCursor>> {
        self.state.lock().ensure_open()?;
        Ok(Box::new(MemCursor {
            name: self.name.clone(),
            state: self.state.clone(),
            position: None,
        }))
    }
}

struct MemCursor {
    name: String,
    state: Arc<Mutex<TxState>>,
    position: Option<Vec<u8>>,
}

impl MemCursor {
    fn settle(&mut self, entry: Option<KvEntry>) -> Option<KvEntry> {
        if let Some((key, _)) = &entry {
            self.position = Some(key.clone());
        }
        entry
    }
}

impl KvCursor for MemCursor {
    fn first(&mut self) -> KvDocResult<Option<KvEntry>> {
        let entry = {
            let state = self.state.lock();
            state.ensure_open()?;
            state
                .bucket(&self.name)?
                .entries
                .iter()
                .next()
                .map(|(k, v)| (k.clone(), v.clone()))
        };
        Ok(self.settle(entry))
    }

    fn next(&mut self) -> KvDocResult<Option<KvEntry>> {
        let Some(position) = self.position.clone() else {
            return self.first();
        };

        let entry = {
            let state = self.state.lock();
            state.ensure_open()?;
            state
                .bucket(&self.name)?
                .entries
                .range((Excluded(position), Unbounded))
                .next()
                .map(|(k, v)| (k.clone(), v.clone()))
        };
        Ok(self.settle(entry))
    }

    fn seek(&mut self, key: &[u8]) -> KvDocResult<Option<KvEntry>> {
        let entry = {
            let state = self.state.lock();
            state.ensure_open()?;
            state
                .bucket(&self.name)?
                .entries
                .range(key.to_vec()..)
                .next()
                .map(|(k, v)| (k.clone(), v.clone()))
        };
        Ok(self.settle(entry))
    }
}
