//! Lazy iterators over the primary bucket of a collection.
//!
//! Query execution is a short chain of [KvIter]s: a [FilterIter] (full scan with
//! a predicate) or a [KeysIter] (ids resolved from indexes) selects documents and
//! applies skip/limit, and an optional [SortIter] reorders the selected window.

mod filter_iter;
mod keys_iter;
mod sort_iter;

pub(crate) use filter_iter::*;
pub(crate) use keys_iter::*;
pub use sort_iter::SortField;
pub(crate) use sort_iter::SortIter;

use crate::errors::KvDocResult;

/// A forward-only, single-pass iterator over primary bucket entries.
///
/// Call [KvIter::next] before reading [KvIter::key] and [KvIter::value]; both
/// return empty slices when the iterator is not positioned on an entry.
pub(crate) trait KvIter: Send {
    /// Advances to the next entry. Returns false once the iterator is exhausted.
    fn next(&mut self) -> KvDocResult<bool>;

    fn key(&self) -> &[u8];

    fn value(&self) -> &[u8];
}

/// Skip/limit bookkeeping shared by the selecting iterators.
///
/// Skipped entries never count toward the limit. A limit of 0 is unbounded.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Window {
    skip: usize,
    limit: usize,
    skipped: usize,
    returned: usize,
}

impl Window {
    pub(crate) fn new(skip: usize, limit: usize) -> Window {
        Window {
            skip,
            limit,
            skipped: 0,
            returned: 0,
        }
    }

    /// True once `limit` entries have been returned.
    pub(crate) fn is_full(&self) -> bool {
        self.limit > 0 && self.returned >= self.limit
    }

    /// Offers one matching entry. Returns true if it should be returned, false if
    /// it falls in the skipped prefix.
    pub(crate) fn admit(&mut self) -> bool {
        if self.skipped < self.skip {
            self.skipped += 1;
            return false;
        }
        self.returned += 1;
        true
    }
}
