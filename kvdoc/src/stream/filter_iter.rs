use crate::collection::Document;
use crate::errors::{ErrorKind, KvDocError, KvDocResult};
use crate::filter::Predicate;
use crate::store::{KvCursor, KvEntry};
use crate::stream::{KvIter, Window};

/// Full scan of a primary bucket, keeping the entries a predicate accepts.
///
/// Values are decoded only when a predicate is present. Skip and limit count
/// matching entries only.
pub(crate) struct FilterIter {
    cursor: Box<dyn KvCursor>,
    predicate: Option<Predicate>,
    window: Window,
    started: bool,
    done: bool,
    current: Option<KvEntry>,
}

impl FilterIter {
    pub(crate) fn new(
        cursor: Box<dyn KvCursor>,
        predicate: Option<Predicate>,
        skip: usize,
        limit: usize,
    ) -> FilterIter {
        FilterIter {
            cursor,
            predicate,
            window: Window::new(skip, limit),
            started: false,
            done: false,
            current: None,
        }
    }

    fn advance(&mut self) -> KvDocResult<Option<KvEntry>> {
        if self.started {
            self.cursor.next()
        } else {
            self.started = true;
            self.cursor.first()
        }
    }

    fn accepts(&self, key: &[u8], value: &[u8]) -> KvDocResult<bool> {
        let Some(predicate) = &self.predicate else {
            return Ok(true);
        };
        let key = std::str::from_utf8(key).map_err(|err| {
            log::error!("Primary key is not valid UTF-8: {}", err);
            KvDocError::new(
                &format!("Primary key is not valid UTF-8: {}", err),
                ErrorKind::SerializationError,
            )
        })?;
        let doc = Document::from_bytes(value)?;
        Ok(predicate(key, &doc))
    }
}

impl KvIter for FilterIter {
    fn next(&mut self) -> KvDocResult<bool> {
        self.current = None;
        if self.done || self.window.is_full() {
            self.done = true;
            return Ok(false);
        }

        while let Some((key, value)) = self.advance()? {
            if !self.accepts(&key, &value)? {
                continue;
            }
            if !self.window.admit() {
                continue;
            }
            self.current = Some((key, value));
            return Ok(true);
        }

        self.done = true;
        Ok(false)
    }

    fn key(&self) -> &[u8] {
        self.current.as_ref().map(|(k, _)| k.as_slice()).unwrap_or_default()
    }

    fn value(&self) -> &[u8] {
        self.current.as_ref().map(|(_, v)| v.as_slice()).unwrap_or_default()
    }
}
