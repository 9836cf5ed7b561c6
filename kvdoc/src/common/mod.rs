//! Common types shared by every layer of the engine: the dynamically typed
//! [Value], the comparator that orders values, and reserved names.

mod compare;
mod constants;
mod value;

pub use compare::*;
pub use constants::*;
pub use value::*;
