use crate::errors::KvDocResult;
use crate::store::{KvBucket, KvCursor, KvEntry, KvStore, KvTransaction};
use std::sync::Arc;

/// A [KvStore] decorator that logs every primitive call.
///
/// Each call on the store, its transactions, buckets and cursors produces one
/// `debug` record naming the operation and its target; failures are additionally
/// logged at `error` level before being returned unchanged. Enabled on a
/// `DocStore` through the `log_operations` setting.
#[derive(Clone)]
pub struct LoggingStore {
    inner: Arc<dyn KvStore>,
}

impl LoggingStore {
    pub fn new(inner: Arc<dyn KvStore>) -> LoggingStore {
        LoggingStore { inner }
    }
}

fn traced<T>(operation: &str, target: &str, result: KvDocResult<T>) -> KvDocResult<T> {
    if let Err(err) = &result {
        log::error!("kv {} on {} failed: {}", operation, target, err);
    }
    result
}

fn printable(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

impl KvStore for LoggingStore {
    fn begin(&self, writable: bool) -> KvDocResult<Box<dyn KvTransaction>> {
        log::debug!("kv begin writable={}", writable);
        let tx = traced("begin", "store", self.inner.begin(writable))?;
        Ok(Box::new(LoggingTransaction { inner: tx }))
    }

    fn close(&self) -> KvDocResult<()> {
        log::debug!("kv close");
        traced("close", "store", self.inner.close())
    }
}

struct LoggingTransaction {
    inner: Box<dyn KvTransaction>,
}

impl KvTransaction for LoggingTransaction {
    fn is_writable(&self) -> bool {
        self.inner.is_writable()
    }

    fn bucket(
        &self,
        name: &str,
        create_if_missing: bool,
    ) -> KvDocResult<Option<Box<dyn KvBucket>>> {
        log::debug!("kv bucket {} create={}", name, create_if_missing);
        let bucket = traced("bucket", name, self.inner.bucket(name, create_if_missing))?;
        Ok(bucket.map(|inner| {
            Box::new(LoggingBucket {
                name: name.to_string(),
                inner,
            }) as Box<dyn KvBucket>
        }))
    }

    fn commit(&self) -> KvDocResult<()> {
        log::debug!("kv commit");
        traced("commit", "transaction", self.inner.commit())
    }

    fn rollback(&self) -> KvDocResult<()> {
        log::debug!("kv rollback");
        traced("rollback", "transaction", self.inner.rollback())
    }
}

struct LoggingBucket {
    name: String,
    inner: Box<dyn KvBucket>,
}

impl KvBucket for LoggingBucket {
    fn get(&self, key: &[u8]) -> KvDocResult<Option<Vec<u8>>> {
        log::debug!("kv get {}[{}]", self.name, printable(key));
        traced("get", &self.name, self.inner.get(key))
    }

    fn set(&self, key: &[u8], value: &[u8]) -> KvDocResult<()> {
        log::debug!(
            "kv set {}[{}] ({} bytes)",
            self.name,
            printable(key),
            value.len()
        );
        traced("set", &self.name, self.inner.set(key, value))
    }

    fn delete(&self, key: &[u8]) -> KvDocResult<()> {
        log::debug!("kv delete {}[{}]", self.name, printable(key));
        traced("delete", &self.name, self.inner.delete(key))
    }

    fn next_sequence(&self) -> KvDocResult<u64> {
        let sequence = traced("next_sequence", &self.name, self.inner.next_sequence())?;
        log::debug!("kv next_sequence {} -> {}", self.name, sequence);
        Ok(sequence)
    }

    fn cursor(&self) -> KvDocResult<Box<dyn KvCursor>> {
        log::debug!("kv cursor {}", self.name);
        let inner = traced("cursor", &self.name, self.inner.cursor())?;
        Ok(Box::new(LoggingCursor {
            name: self.name.clone(),
            inner,
        }))
    }
}

struct LoggingCursor {
    name: String,
    inner: Box<dyn KvCursor>,
}

impl LoggingCursor {
    fn report(&self, operation: &str, entry: &Option<KvEntry>) {
        match entry {
            Some((key, _)) => log::debug!("kv {} {} -> {}", operation, self.name, printable(key)),
            None => log::debug!("kv {} {} -> end", operation, self.name),
        }
    }
}

impl KvCursor for LoggingCursor {
    fn first(&mut self) -> KvDocResult<Option<KvEntry>> {
        let entry = traced("first", &self.name, self.inner.first())?;
        self.report("first", &entry);
        Ok(entry)
    }

    fn next(&mut self) -> KvDocResult<Option<KvEntry>> {
        let entry = traced("next", &self.name, self.inner.next())?;
        self.report("next", &entry);
        Ok(entry)
    }

    fn seek(&mut self, key: &[u8]) -> KvDocResult<Option<KvEntry>> {
        let entry = traced("seek", &self.name, self.inner.seek(key))?;
        self.report(&format!("seek [{}]", printable(key)), &entry);
        Ok(entry)
    }
}
