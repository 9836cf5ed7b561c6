#![allow(clippy::module_inception)]
//! # kvdoc - Document store over ordered key-value stores
//!
//! kvdoc turns any store offering transactions, named buckets, sequences and
//! ordered cursors into a small document database: named collections of
//! schemaless or typed documents, secondary indexes on string fields, a filter
//! language, sorting, paging and cursors.
//!
//! ## Quick Start
//!
//! ```rust
//! use kvdoc::filter::field;
//! use kvdoc::{doc, DocStore, Document};
//!
//! # fn main() -> Result<(), kvdoc::errors::KvDocError> {
//! let store = DocStore::in_memory()?;
//! let users = store.collection("users")?;
//!
//! users.insert(&mut [
//!     doc! { name: "bob", email: "bob@mail.net", age: 20 },
//!     doc! { name: "rob", email: "rob@mail.net", age: 25 },
//! ])?;
//!
//! let bob: Document = users.find([field("name").eq("bob")]).one()?;
//! assert_eq!(bob.get_str("email"), Some("bob@mail.net"));
//!
//! let older = users.find([field("age").gt(20)]).count()?;
//! assert_eq!(older, 1);
//!
//! store.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Storage layout
//!
//! Every collection is one primary bucket keyed by document id. Each indexed
//! field gets its own bucket, `idx_<collection>_<field>` by default, mapping a
//! string value to the ids of the documents holding it. Queries made only of
//! string equalities over indexed fields are answered from those buckets; all
//! other queries scan the primary bucket.
//!
//! ## Module Organization
//!
//! - [`collection`] - Collections, documents, entities, views and cursors
//! - [`common`] - The [Value] model and its total order
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - The filter language
//! - [`store`] - The key-value contract, an in-memory store and a logging wrapper
//! - [`stream`] - Sort fields used by views

pub mod collection;
pub mod common;
pub mod errors;
pub mod filter;
pub mod store;
pub mod stream;

pub(crate) mod index;

mod doc_store;
mod doc_store_builder;
mod doc_store_config;

pub use collection::{Collection, Cursor, Document, Entity, IndexFields, Selector, View};
pub use common::Value;
pub use doc_store::DocStore;
pub use doc_store_builder::DocStoreBuilder;
pub use doc_store_config::DocStoreConfig;

#[doc(hidden)]
pub use indexmap;
