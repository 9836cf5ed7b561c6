use crate::collection::Document;
use crate::common::{compare, equals, normalize_field, Value, DOC_ID};
use crate::errors::KvDocResult;
use crate::filter::{Condition, Filter, OpKind};
use std::borrow::Cow;
use std::cmp::Ordering;

/// A compiled filter, evaluated against a primary key and its decoded document.
pub(crate) type Predicate = Box<dyn Fn(&str, &Document) -> bool + Send + Sync>;

/// Compiles a list of filters into a single predicate.
///
/// The filters of the list are combined with AND. An empty list compiles to
/// `None`, meaning every document matches.
///
/// # Errors
///
/// Returns `InvalidQuery` if any filter of the list is malformed.
pub(crate) fn make_predicate(filters: &[Filter]) -> KvDocResult<Option<Predicate>> {
    if filters.is_empty() {
        return Ok(None);
    }
    for filter in filters {
        filter.validate()?;
    }

    let mut compiled: Vec<Predicate> = filters.iter().map(compile).collect();
    if compiled.len() == 1 {
        return Ok(compiled.pop());
    }
    Ok(Some(Box::new(move |key: &str, doc: &Document| {
        compiled.iter().all(|p| p(key, doc))
    })))
}

fn compile(filter: &Filter) -> Predicate {
    match filter {
        Filter::Fields(fields) => {
            let tests: Vec<Predicate> = fields
                .iter()
                .map(|(name, cond)| compile_field(normalize_field(name).to_string(), cond.clone()))
                .collect();
            Box::new(move |key: &str, doc: &Document| tests.iter().all(|t| t(key, doc)))
        }
        Filter::And(filters) => {
            let children: Vec<Predicate> = filters.iter().map(compile).collect();
            Box::new(move |key: &str, doc: &Document| children.iter().all(|c| c(key, doc)))
        }
        Filter::Or(filters) => {
            let children: Vec<Predicate> = filters.iter().map(compile).collect();
            Box::new(move |key: &str, doc: &Document| children.iter().any(|c| c(key, doc)))
        }
        Filter::Not(filter) => {
            let inner = compile(filter);
            Box::new(move |key: &str, doc: &Document| !inner(key, doc))
        }
    }
}

fn compile_field(name: String, condition: Condition) -> Predicate {
    Box::new(move |key: &str, doc: &Document| match field_value(&name, key, doc) {
        Some(value) => test_condition(&condition, &value),
        None => false,
    })
}

/// Resolves a field of a candidate. The `id` pseudo-field falls back to the
/// primary key when the stored document does not carry one.
fn field_value<'a>(name: &str, key: &str, doc: &'a Document) -> Option<Cow<'a, Value>> {
    match doc.get(name) {
        Some(value) => Some(Cow::Borrowed(value)),
        None if name == DOC_ID => Some(Cow::Owned(Value::from(key))),
        None => None,
    }
}

fn test_condition(condition: &Condition, value: &Value) -> bool {
    match condition {
        Condition::Eq(operand) => equals(value, operand),
        Condition::In(members) => members.iter().any(|m| equals(value, m)),
        Condition::NotIn(members) => !members.iter().any(|m| equals(value, m)),
        Condition::Op(op, operand) => {
            let ord = compare(value, operand);
            match op {
                OpKind::Lt => ord == Ordering::Less,
                OpKind::Lte => ord != Ordering::Greater,
                OpKind::Gt => ord == Ordering::Greater,
                OpKind::Gte => ord != Ordering::Less,
                OpKind::Ne => ord != Ordering::Equal,
            }
        }
    }
}
