use crate::errors::KvDocResult;

/// A key/value pair returned by a [KvCursor].
pub type KvEntry = (Vec<u8>, Vec<u8>);

/// An ordered key-value store the document engine is layered over.
///
/// # Purpose
/// The engine needs very little from a storage backend: transactions, named
/// buckets of ordered byte keys, a per-bucket sequence and a forward cursor. Any
/// backend that can provide these can host document collections.
///
/// # Implementations
/// - `InMemoryStore`: snapshot-isolated in-memory store
/// - `LoggingStore`: decorator that logs every primitive call of another store
///
/// # Thread Safety
/// Implementers must be `Send + Sync`; the store is shared by every collection.
pub trait KvStore: Send + Sync {
    /// Begins a new transaction.
    ///
    /// # Arguments
    /// * `writable` - Whether the transaction may modify buckets
    ///
    /// # Returns
    /// * `Ok(transaction)` on success
    /// * `Err(KvDocError)` if the store is closed or the backend fails
    fn begin(&self, writable: bool) -> KvDocResult<Box<dyn KvTransaction>>;

    /// Closes the store. Later calls to [KvStore::begin] fail.
    fn close(&self) -> KvDocResult<()>;
}

/// A transaction against a [KvStore].
///
/// Buckets obtained from a transaction are bound to it and fail with
/// `TransactionClosed` once the transaction is committed or rolled back.
pub trait KvTransaction: Send {
    /// Returns true if the transaction was opened for writing.
    fn is_writable(&self) -> bool;

    /// Opens a bucket by name.
    ///
    /// # Arguments
    /// * `name` - The bucket name
    /// * `create_if_missing` - Create the bucket when it does not exist. Requires a
    ///   writable transaction.
    ///
    /// # Returns
    /// * `Ok(Some(bucket))` if the bucket exists or was created
    /// * `Ok(None)` if the bucket does not exist and was not created
    /// * `Err(KvDocError)` if the transaction is finished or the backend fails
    fn bucket(&self, name: &str, create_if_missing: bool)
        -> KvDocResult<Option<Box<dyn KvBucket>>>;

    /// Commits the transaction. A no-op for read transactions and for
    /// transactions that already finished.
    fn commit(&self) -> KvDocResult<()>;

    /// Discards the transaction. A no-op for transactions that already finished.
    fn rollback(&self) -> KvDocResult<()>;
}

/// A named, ordered mapping of byte keys to byte values.
pub trait KvBucket: Send {
    fn get(&self, key: &[u8]) -> KvDocResult<Option<Vec<u8>>>;

    fn set(&self, key: &[u8], value: &[u8]) -> KvDocResult<()>;

    fn delete(&self, key: &[u8]) -> KvDocResult<()>;

    /// Allocates the next value of the bucket's monotonic sequence, starting at 1.
    fn next_sequence(&self) -> KvDocResult<u64>;

    /// Opens a forward cursor over the bucket.
    fn cursor(&self) -> KvDocResult<Box<dyn KvCursor>>;
}

/// A forward cursor over a [KvBucket]. Every method returns `None` at the end.
pub trait KvCursor: Send {
    /// Positions the cursor at the first key.
    fn first(&mut self) -> KvDocResult<Option<KvEntry>>;

    /// Moves to the key after the current one.
    fn next(&mut self) -> KvDocResult<Option<KvEntry>>;

    /// Positions the cursor at the first key greater than or equal to `key`.
    fn seek(&mut self, key: &[u8]) -> KvDocResult<Option<KvEntry>>;
}
