//! Query filters for selecting documents from collections.
//!
//! Filters form a small, backend-independent query language. A [Filter] is an
//! immutable tree of field-maps combined with AND, OR and NOT; each field of a
//! field-map carries one [Condition].
//!
//! # Creating Filters
//!
//! - `field("age").gt(30)` - single-field comparison
//! - `field("name").eq("Alice")` - equality
//! - `m!{ "name" => "bob", "age" => gte(20) }` - several fields at once
//! - `by_id("7")` - match by document id
//! - `and(vec![..])`, `or(vec![..])`, `not(..)` or the `Filter::and/or/not` methods
//!
//! # Examples
//!
//! ```rust,ignore
//! use kvdoc::filter::{field, gte, lte, or};
//! use kvdoc::m;
//!
//! let lookup = or(vec![
//!     m! { "id" => "bob" },
//!     m! { "name" => "bob" },
//!     m! { "email" => "bob" },
//! ]);
//! let window = m! { "age" => gte(20) }.and(m! { "age" => lte(25) });
//! let users = collection.find([window]).all::<User>()?;
//! ```
//!
//! # Execution
//!
//! A filter built only from non-empty string equalities (and `id` equalities)
//! joined by AND/OR is answered from secondary indexes. Anything else is
//! evaluated by scanning the collection. Both strategies return the same
//! documents.

mod filter;
mod fluent;
mod predicate;

pub use filter::*;
pub use fluent::*;
pub(crate) use predicate::*;
