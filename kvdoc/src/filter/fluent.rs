use crate::common::Value;
use crate::filter::{Condition, Filter, OpKind};

/// Creates a fluent filter builder for the specified field name.
///
/// # Arguments
///
/// * `field_name` - The name of the field to filter on. `_id` is an alias of `id`.
///
/// # Returns
///
/// A `FluentFilter` builder for constructing single-field filters
pub fn field(field_name: &str) -> FluentFilter {
    FluentFilter {
        field_name: field_name.to_string(),
    }
}

/// A fluent builder for filters on a single field.
///
/// Every method consumes the builder and returns a [Filter::Fields] node with one
/// condition, ready to be passed to `Collection::find` or combined with other
/// filters.
pub struct FluentFilter {
    field_name: String,
}

impl FluentFilter {
    fn build(self, condition: Condition) -> Filter {
        Filter::field(&self.field_name, condition)
    }

    /// Matches documents where the field equals `value`.
    ///
    /// Equality on a non-empty string can be answered from a secondary index.
    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> Filter {
        self.build(Condition::Eq(value.into()))
    }

    /// Matches documents where the field does not equal `value`.
    #[inline]
    pub fn ne<T: Into<Value>>(self, value: T) -> Filter {
        self.build(Condition::Op(OpKind::Ne, value.into()))
    }

    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> Filter {
        self.build(Condition::Op(OpKind::Gt, value.into()))
    }

    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> Filter {
        self.build(Condition::Op(OpKind::Gte, value.into()))
    }

    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> Filter {
        self.build(Condition::Op(OpKind::Lt, value.into()))
    }

    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> Filter {
        self.build(Condition::Op(OpKind::Lte, value.into()))
    }

    /// Matches documents where the field equals any of `values`.
    ///
    /// # Arguments
    ///
    /// * `values` - Candidate values. An empty list matches nothing.
    #[inline]
    pub fn in_array<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        self.build(Condition::In(values.into_iter().map(Into::into).collect()))
    }

    /// Matches documents where the field equals none of `values`.
    ///
    /// Documents without the field never match.
    #[inline]
    pub fn not_in_array<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        self.build(Condition::NotIn(values.into_iter().map(Into::into).collect()))
    }
}
