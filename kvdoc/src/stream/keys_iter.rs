use crate::errors::KvDocResult;
use crate::store::{KvCursor, KvEntry};
use crate::stream::{KvIter, Window};

/// Walks a pre-resolved, ascending list of document ids.
///
/// Each id is looked up with a cursor seek; ids whose document no longer exists
/// are skipped without error and do not count toward skip or limit.
pub(crate) struct KeysIter {
    cursor: Box<dyn KvCursor>,
    ids: std::vec::IntoIter<String>,
    window: Window,
    current: Option<KvEntry>,
}

impl KeysIter {
    pub(crate) fn new(
        cursor: Box<dyn KvCursor>,
        ids: Vec<String>,
        skip: usize,
        limit: usize,
    ) -> KeysIter {
        KeysIter {
            cursor,
            ids: ids.into_iter(),
            window: Window::new(skip, limit),
            current: None,
        }
    }
}

impl KvIter for KeysIter {
    fn next(&mut self) -> KvDocResult<bool> {
        self.current = None;
        if self.window.is_full() {
            return Ok(false);
        }

        for id in self.ids.by_ref() {
            let entry = match self.cursor.seek(id.as_bytes())? {
                // seek lands on the next key when the id itself is gone
                Some(entry) if entry.0 == id.as_bytes() => entry,
                _ => continue,
            };
            if !self.window.admit() {
                continue;
            }
            self.current = Some(entry);
            return Ok(true);
        }
        Ok(false)
    }

    fn key(&self) -> &[u8] {
        self.current.as_ref().map(|(k, _)| k.as_slice()).unwrap_or_default()
    }

    fn value(&self) -> &[u8] {
        self.current.as_ref().map(|(_, v)| v.as_slice()).unwrap_or_default()
    }
}
