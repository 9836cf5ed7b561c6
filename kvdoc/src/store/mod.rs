//! Ordered key-value primitives.
//!
//! The document engine only talks to storage through the [KvStore] family of
//! traits: transactions, named buckets of ordered byte keys, a per-bucket
//! sequence and a forward cursor.
//!
//! # Implementations
//!
//! - **In-Memory Store**: [memory::InMemoryStore], snapshot-isolated and used by
//!   tests and `DocStore::in_memory()`
//! - **Logging Store**: [LoggingStore], a decorator that writes one debug record per
//!   primitive call of the store it wraps
//!
//! Any other backend can host collections by implementing the four traits.

mod kv;
mod logging;
pub mod memory;

pub use kv::*;
pub use logging::*;
