use kvdoc::errors::KvDocResult;
use kvdoc::store::memory::InMemoryStore;
use kvdoc::DocStore;
use std::backtrace::Backtrace;
use std::time::Instant;

/// Runs a test between a setup and a teardown step.
///
/// `after` runs even when `test` fails. Failures and panics are reported with
/// the error's debug chain before the test is failed.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> KvDocResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> KvDocResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> KvDocResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let start_time = Instant::now();
    let result = std::panic::catch_unwind(|| {
        let backtrace = Backtrace::capture();
        match before() {
            Ok(ctx) => match test(ctx.clone()) {
                Ok(_) => after(ctx)
                    .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                Err(e) => {
                    let _ = after(ctx);
                    Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                }
            },
            Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
        }
    });
    let elapsed = start_time.elapsed();

    let (error, backtrace) = match result {
        Ok(Ok(_)) => return,
        Ok(Err((error, backtrace))) => (error, backtrace),
        Err(panic_err) => {
            let message = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            (format!("Panic: {}", message), Backtrace::capture().to_string())
        }
    };

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {:?}", elapsed);
    eprintln!("Error: {}", error);
    if !backtrace.is_empty() && !backtrace.contains("disabled") {
        eprintln!("\nBacktrace:\n{}", backtrace);
    }
    eprintln!("=====================================================\n");

    panic!("{}", error);
}

#[derive(Clone)]
pub struct TestContext {
    kv: InMemoryStore,
    store: DocStore,
}

impl TestContext {
    pub fn new(kv: InMemoryStore, store: DocStore) -> Self {
        Self { kv, store }
    }

    /// The key-value store under the document store, for inspecting raw buckets.
    pub fn kv(&self) -> &InMemoryStore {
        &self.kv
    }

    pub fn store(&self) -> DocStore {
        self.store.clone()
    }
}

/// Opens a document store over a fresh in-memory store.
pub fn create_test_context() -> KvDocResult<TestContext> {
    let kv = InMemoryStore::new();
    let store = DocStore::builder().kv_store(kv.clone()).open()?;
    Ok(TestContext::new(kv, store))
}

/// Same as [create_test_context] with every key-value call logged.
pub fn create_logging_test_context() -> KvDocResult<TestContext> {
    let kv = InMemoryStore::new();
    let store = DocStore::builder()
        .kv_store(kv.clone())
        .log_operations(true)
        .open()?;
    Ok(TestContext::new(kv, store))
}

pub fn cleanup(ctx: TestContext) -> KvDocResult<()> {
    ctx.store().close()
}
