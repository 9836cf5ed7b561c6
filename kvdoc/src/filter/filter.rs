use crate::common::{normalize_field, Value, DOC_ID};
use crate::errors::{ErrorKind, KvDocError, KvDocResult};
use indexmap::IndexMap;
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// Comparison operators usable in a [Condition::Op].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Lt,
    Lte,
    Gt,
    Gte,
    Ne,
}

impl OpKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            OpKind::Lt => "<",
            OpKind::Lte => "<=",
            OpKind::Gt => ">",
            OpKind::Gte => ">=",
            OpKind::Ne => "!=",
        }
    }
}

/// The test applied to one field of a [Filter::Fields] node.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// The field equals the value.
    Eq(Value),
    /// The field equals any member of the set. An empty set matches nothing.
    In(Vec<Value>),
    /// The field equals no member of the set. An empty set matches every document
    /// that has the field.
    NotIn(Vec<Value>),
    /// The field compares to the operand as the operator requires.
    Op(OpKind, Value),
}

impl Condition {
    /// Returns true for a plain equality on a non-empty string, the only form of
    /// condition an index lookup can answer.
    pub fn is_string_equality(&self) -> bool {
        matches!(self, Condition::Eq(Value::String(s)) if !s.is_empty())
    }
}

macro_rules! condition_from {
    ($($t:ty),*) => {
        $(impl From<$t> for Condition {
            fn from(value: $t) -> Self {
                Condition::Eq(Value::from(value))
            }
        })*
    };
}

condition_from!(
    Value, bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, &str, String,
    &String
);

impl Display for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::Eq(v) => write!(f, "== {}", v),
            Condition::In(vs) => write!(f, "in [{}]", vs.iter().join(", ")),
            Condition::NotIn(vs) => write!(f, "not in [{}]", vs.iter().join(", ")),
            Condition::Op(op, v) => write!(f, "{} {}", op.symbol(), v),
        }
    }
}

/// A node of the query language.
///
/// Filters are plain immutable values built with [field](crate::filter::field),
/// the [m!](crate::m) macro and the [and], [or] and [not] combinators, and can be
/// nested freely. The same filter tree can be evaluated against a full scan or
/// answered from secondary indexes; the result set does not depend on which
/// strategy the planner picks.
///
/// # Examples
///
/// ```rust,ignore
/// use kvdoc::filter::{field, gte, lte};
/// use kvdoc::m;
///
/// let by_name = field("name").eq("bob");
/// let in_range = m!{ "age" => gte(20) }.and(m!{ "age" => lte(25) });
/// let either = by_name.or(in_range);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Conjunction of one condition per named field.
    Fields(IndexMap<String, Condition>),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    /// Creates a field-map holding a single condition.
    pub fn field(name: &str, condition: impl Into<Condition>) -> Filter {
        let mut fields = IndexMap::with_capacity(1);
        fields.insert(name.to_string(), condition.into());
        Filter::Fields(fields)
    }

    /// Combines this filter with another using logical AND.
    pub fn and(self, filter: Filter) -> Filter {
        Filter::And(vec![self, filter])
    }

    /// Combines this filter with another using logical OR.
    pub fn or(self, filter: Filter) -> Filter {
        Filter::Or(vec![self, filter])
    }

    /// Negates this filter.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Filter {
        Filter::Not(Box::new(self))
    }

    /// Checks the tree for malformed nodes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` for an empty field-map, an empty field name, or an
    /// `And`/`Or` without children, wherever they appear in the tree.
    pub fn validate(&self) -> KvDocResult<()> {
        match self {
            Filter::Fields(fields) => {
                if fields.is_empty() {
                    return Err(invalid_query("field-map filter has no fields"));
                }
                if fields.keys().any(|name| name.is_empty()) {
                    return Err(invalid_query("filter field name cannot be empty"));
                }
                Ok(())
            }
            Filter::And(filters) | Filter::Or(filters) => {
                if filters.is_empty() {
                    return Err(invalid_query(&format!(
                        "{} filter has no operands",
                        self.kind_name()
                    )));
                }
                filters.iter().try_for_each(Filter::validate)
            }
            Filter::Not(filter) => filter.validate(),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Filter::Fields(_) => "field-map",
            Filter::And(_) => "and",
            Filter::Or(_) => "or",
            Filter::Not(_) => "not",
        }
    }
}

fn invalid_query(message: &str) -> KvDocError {
    log::error!("Invalid query: {}", message);
    KvDocError::new(message, ErrorKind::InvalidQuery)
}

fn join_filters(f: &mut Formatter<'_>, filters: &[Filter], op: &str) -> std::fmt::Result {
    write!(f, "({})", filters.iter().join(op))
}

impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::Fields(fields) => {
                let rendered = fields
                    .iter()
                    .map(|(name, cond)| format!("{} {}", normalize_field(name), cond))
                    .join(" && ");
                if fields.len() > 1 {
                    write!(f, "({})", rendered)
                } else {
                    write!(f, "{}", rendered)
                }
            }
            Filter::And(filters) => join_filters(f, filters, " && "),
            Filter::Or(filters) => join_filters(f, filters, " || "),
            Filter::Not(filter) => write!(f, "!({})", filter),
        }
    }
}

/// Combines multiple filters using logical AND.
pub fn and(filters: Vec<Filter>) -> Filter {
    Filter::And(filters)
}

/// Combines multiple filters using logical OR.
pub fn or(filters: Vec<Filter>) -> Filter {
    Filter::Or(filters)
}

/// Negates a filter.
pub fn not(filter: Filter) -> Filter {
    Filter::Not(Box::new(filter))
}

/// Matches the document with the given identifier.
pub fn by_id(id: &str) -> Filter {
    Filter::field(DOC_ID, id)
}

/// `field < value`
pub fn lt<T: Into<Value>>(value: T) -> Condition {
    Condition::Op(OpKind::Lt, value.into())
}

/// `field <= value`
pub fn lte<T: Into<Value>>(value: T) -> Condition {
    Condition::Op(OpKind::Lte, value.into())
}

/// `field > value`
pub fn gt<T: Into<Value>>(value: T) -> Condition {
    Condition::Op(OpKind::Gt, value.into())
}

/// `field >= value`
pub fn gte<T: Into<Value>>(value: T) -> Condition {
    Condition::Op(OpKind::Gte, value.into())
}

/// `field != value`
pub fn ne<T: Into<Value>>(value: T) -> Condition {
    Condition::Op(OpKind::Ne, value.into())
}

/// `field in values`
pub fn in_set<T: Into<Value>>(values: Vec<T>) -> Condition {
    Condition::In(values.into_iter().map(Into::into).collect())
}

/// `field not in values`
pub fn not_in<T: Into<Value>>(values: Vec<T>) -> Condition {
    Condition::NotIn(values.into_iter().map(Into::into).collect())
}

/// Builds a [Filter::Fields] node from `name => condition` pairs.
///
/// A bare value on the right-hand side is an equality test; the condition helpers
/// ([gte], [in_set], ...) build the other forms.
///
/// ```rust
/// use kvdoc::filter::{gte, Filter};
/// use kvdoc::m;
///
/// let filter = m! { "name" => "bob", "age" => gte(20) };
/// assert!(matches!(filter, Filter::Fields(ref f) if f.len() == 2));
/// ```
#[macro_export]
macro_rules! m {
    ($($name:expr => $cond:expr),+ $(,)?) => {
        {
            let mut fields = $crate::indexmap::IndexMap::new();
            $(
                fields.insert(
                    ::std::string::ToString::to_string(&$name),
                    $crate::filter::Condition::from($cond),
                );
            )+
            $crate::filter::Filter::Fields(fields)
        }
    };
}
