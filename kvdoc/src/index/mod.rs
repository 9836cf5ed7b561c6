//! Secondary indexes.
//!
//! A collection keeps one index bucket per indexed field. Each entry maps a
//! string value to the encoded set of ids of the documents holding it.
//! [CollectionIndex] keeps the buckets in step with the primary bucket on every
//! write, and [Lookup] answers equality filters from them.

mod collection_index;
mod keys;
mod lookup;

pub(crate) use collection_index::*;
pub(crate) use keys::*;
pub(crate) use lookup::*;
