//! Collections, documents and queries.
//!
//! A [Collection] stores documents of any type implementing [Entity]. The
//! schemaless [Document] is the built-in entity; application structs opt in by
//! implementing the trait, which tells the engine where the id lives and which
//! fields to index.
//!
//! ```rust,ignore
//! use kvdoc::{doc, DocStore};
//! use kvdoc::filter::field;
//!
//! let store = DocStore::in_memory()?;
//! let users = store.collection("users")?;
//! users.insert(&mut [doc!{ name: "bob", age: 20 }, doc!{ name: "ben", age: 30 }])?;
//!
//! let view = users.find([field("age").gte(20)]).sort(&["-age"]);
//! let mut cursor = view.cursor()?;
//! while let Some(doc) = cursor.next_document()? {
//!     println!("{}", doc);
//! }
//! ```
//!
//! Queries are immutable [View]s; nothing runs until a terminal method such as
//! [View::all] or [View::cursor] is called. Updates and deletes take a
//! [Selector], either a document id or a filter.

mod collection;
mod cursor;
mod document;
mod entity;
mod selector;
mod view;

pub use collection::*;
pub use cursor::*;
pub use document::*;
pub use entity::{Entity, IndexFields};
pub(crate) use entity::{IndexMeta, IndexMetaCache};
pub use selector::*;
pub use view::View;
