use crate::collection::Document;
use crate::common::{compare, normalize_field, Value, DESCENDING_PREFIX, DOC_ID};
use crate::errors::{ErrorKind, KvDocError, KvDocResult};
use crate::store::KvEntry;
use crate::stream::KvIter;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// One key of a multi-key sort.
///
/// Parsed from a field name, optionally prefixed with `-` for descending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    field: String,
    descending: bool,
}

impl SortField {
    /// Parses `"name"` (ascending) or `"-name"` (descending). `_id` sorts by `id`.
    pub fn parse(spec: &str) -> SortField {
        match spec.strip_prefix(DESCENDING_PREFIX) {
            Some(field) => SortField {
                field: normalize_field(field).to_string(),
                descending: true,
            },
            None => SortField {
                field: normalize_field(spec).to_string(),
                descending: false,
            },
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }

    pub(crate) fn validate(&self) -> KvDocResult<()> {
        if self.field.is_empty() {
            log::error!("Sort field name cannot be empty");
            return Err(KvDocError::new(
                "Sort field name cannot be empty",
                ErrorKind::InvalidQuery,
            ));
        }
        Ok(())
    }
}

impl Display for SortField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.descending {
            write!(f, "{}{}", DESCENDING_PREFIX, self.field)
        } else {
            write!(f, "{}", self.field)
        }
    }
}

/// Reorders the entries of another iterator.
///
/// On the first call to `next` the input is drained into memory and decoded,
/// then sorted stably by the sort fields using the value comparator. A field
/// missing from a document sorts as null. Ties on every field keep input order.
pub(crate) struct SortIter {
    input: Option<Box<dyn KvIter>>,
    fields: Arc<[SortField]>,
    sorted: std::vec::IntoIter<KvEntry>,
    current: Option<KvEntry>,
}

impl SortIter {
    pub(crate) fn new(input: Box<dyn KvIter>, fields: Arc<[SortField]>) -> SortIter {
        SortIter {
            input: Some(input),
            fields,
            sorted: Vec::new().into_iter(),
            current: None,
        }
    }

    fn load(&mut self, mut input: Box<dyn KvIter>) -> KvDocResult<()> {
        let mut rows: Vec<(Vec<Value>, KvEntry)> = Vec::new();
        while input.next()? {
            let key = input.key().to_vec();
            let value = input.value().to_vec();
            let doc = Document::from_bytes(&value)?;
            let sort_keys = self
                .fields
                .iter()
                .map(|f| sort_value(f.field(), &key, &doc))
                .collect();
            rows.push((sort_keys, (key, value)));
        }

        let fields = self.fields.clone();
        rows.sort_by(|(a, _), (b, _)| {
            for (i, field) in fields.iter().enumerate() {
                let ord = compare(&a[i], &b[i]);
                if ord != Ordering::Equal {
                    return if field.is_descending() { ord.reverse() } else { ord };
                }
            }
            Ordering::Equal
        });

        log::debug!("Sorted {} entries by {:?}", rows.len(), self.fields);
        self.sorted = rows
            .into_iter()
            .map(|(_, entry)| entry)
            .collect::<Vec<_>>()
            .into_iter();
        Ok(())
    }
}

fn sort_value(field: &str, key: &[u8], doc: &Document) -> Value {
    match doc.get(field) {
        Some(value) => value.clone(),
        None if field == DOC_ID => Value::from(String::from_utf8_lossy(key).into_owned()),
        None => Value::Null,
    }
}

impl KvIter for SortIter {
    fn next(&mut self) -> KvDocResult<bool> {
        if let Some(input) = self.input.take() {
            self.load(input)?;
        }
        self.current = self.sorted.next();
        Ok(self.current.is_some())
    }

    fn key(&self) -> &[u8] {
        self.current.as_ref().map(|(k, _)| k.as_slice()).unwrap_or_default()
    }

    fn value(&self) -> &[u8] {
        self.current.as_ref().map(|(_, v)| v.as_slice()).unwrap_or_default()
    }
}
