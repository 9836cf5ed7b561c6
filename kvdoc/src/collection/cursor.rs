use crate::collection::entity::from_bytes;
use crate::collection::{Document, Entity};
use crate::errors::{ErrorKind, KvDocError, KvDocResult};
use crate::store::KvTransaction;
use crate::stream::KvIter;

/// A single-pass iteration over query results.
///
/// A cursor owns the transaction it reads from until it is exhausted, closed or
/// dropped. Exhaustion closes it automatically, and every call after close
/// reports no more results.
///
/// # Examples
///
/// ```rust,ignore
/// let mut cursor = users.find([field("age").gte(20)]).sort(&["-age"]).cursor()?;
/// let mut user = User::default();
/// while cursor.next(&mut user)? {
///     println!("{} {}", user.id, user.name);
/// }
/// ```
pub struct Cursor {
    collection: String,
    tx: Option<Box<dyn KvTransaction>>,
    iter: Option<Box<dyn KvIter>>,
}

impl Cursor {
    pub(crate) fn new(
        collection: &str,
        tx: Box<dyn KvTransaction>,
        iter: Box<dyn KvIter>,
    ) -> Cursor {
        log::debug!("Opened cursor on {}", collection);
        Cursor {
            collection: collection.to_string(),
            tx: Some(tx),
            iter: Some(iter),
        }
    }

    /// Decodes the next result into `result` and sets its id from the key.
    ///
    /// # Returns
    /// * `Ok(true)` if `result` now holds the next result
    /// * `Ok(false)` if the cursor is exhausted or closed
    /// * `Err(KvDocError)` if iteration or decoding fails; the cursor is closed
    pub fn next<T: Entity>(&mut self, result: &mut T) -> KvDocResult<bool> {
        match self.fetch::<T>()? {
            Some(entity) => {
                *result = entity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Returns the next result as a [Document], or `None` at the end.
    pub fn next_document(&mut self) -> KvDocResult<Option<Document>> {
        self.fetch::<Document>()
    }

    /// Returns true until the cursor is exhausted or closed.
    pub fn is_open(&self) -> bool {
        self.tx.is_some()
    }

    /// Closes the cursor, releasing its transaction.
    ///
    /// Commits (a no-op for read transactions) and then rolls back, so the
    /// transaction is released either way. Safe to call any number of times.
    pub fn close(&mut self) -> KvDocResult<()> {
        self.iter = None;
        let Some(tx) = self.tx.take() else {
            return Ok(());
        };

        log::debug!("Closing cursor on {}", self.collection);
        let committed = tx.commit();
        if let Err(err) = tx.rollback() {
            log::warn!("Rollback while closing cursor on {} failed: {}", self.collection, err);
        }
        committed.map_err(|e| e.in_operation("cursor close"))
    }

    /// Advances the underlying iterator without decoding.
    pub(crate) fn advance(&mut self) -> KvDocResult<bool> {
        let Some(iter) = self.iter.as_mut() else {
            return Ok(false);
        };
        match iter.next() {
            Ok(true) => Ok(true),
            Ok(false) => {
                self.close()?;
                Ok(false)
            }
            Err(err) => {
                self.abort();
                Err(err.in_operation("cursor"))
            }
        }
    }

    pub(crate) fn fetch<T: Entity>(&mut self) -> KvDocResult<Option<T>> {
        if !self.advance()? {
            return Ok(None);
        }
        match self.decode::<T>() {
            Ok(entity) => Ok(Some(entity)),
            Err(err) => {
                self.abort();
                Err(err.in_operation("cursor"))
            }
        }
    }

    fn decode<T: Entity>(&self) -> KvDocResult<T> {
        let Some(iter) = self.iter.as_ref() else {
            log::error!("Cursor on {} has no current entry", self.collection);
            return Err(KvDocError::new(
                "Cursor has no current entry",
                ErrorKind::InternalError,
            ));
        };
        let id = String::from_utf8(iter.key().to_vec())?;
        let mut entity: T = from_bytes(iter.value())?;
        entity.set_id(id);
        Ok(entity)
    }

    fn abort(&mut self) {
        self.iter = None;
        if let Some(tx) = self.tx.take() {
            if let Err(err) = tx.rollback() {
                log::warn!("Rollback of failed cursor on {} failed: {}", self.collection, err);
            }
        }
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            log::warn!("Closing dropped cursor on {} failed: {}", self.collection, err);
        }
    }
}
