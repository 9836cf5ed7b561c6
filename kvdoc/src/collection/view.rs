use crate::collection::{Collection, Cursor, Document, Entity};
use crate::common::Value;
use crate::errors::{ErrorKind, KvDocError, KvDocResult};
use crate::filter::{make_predicate, Filter};
use crate::index::Lookup;
use crate::store::KvTransaction;
use crate::stream::{FilterIter, KeysIter, KvIter, SortField, SortIter};
use std::sync::Arc;

/// An immutable query over a collection.
///
/// Every modifier returns a new view sharing the filter list and sort fields of
/// the original, which is never changed. A view does nothing until one of its
/// terminal methods (`cursor`, `count`, `one`, `all`, `all_into`) runs it.
///
/// Skip and limit select the window of matching documents first; the sort then
/// orders that window.
///
/// # Examples
///
/// ```rust,ignore
/// let adults = users.find([field("age").gte(18)]);
/// let page = adults.sort(&["name"]).skip(20).limit(10).all::<User>()?;
/// let total = adults.count()?;
/// ```
#[derive(Clone)]
pub struct View {
    collection: Collection,
    filters: Arc<[Filter]>,
    sort: Arc<[SortField]>,
    skip: usize,
    limit: usize,
}

impl View {
    pub(crate) fn new(collection: Collection, filters: Vec<Filter>) -> View {
        View {
            collection,
            filters: filters.into(),
            sort: Arc::new([]),
            skip: 0,
            limit: 0,
        }
    }

    /// Returns a view yielding at most `limit` documents. 0 means unbounded.
    pub fn limit(&self, limit: usize) -> View {
        View {
            limit,
            ..self.clone()
        }
    }

    /// Returns a view that skips the first `skip` matching documents.
    pub fn skip(&self, skip: usize) -> View {
        View {
            skip,
            ..self.clone()
        }
    }

    /// Returns a view sorted by `fields`, each optionally prefixed with `-` for
    /// descending order. Replaces any previous sort.
    pub fn sort<S: AsRef<str>>(&self, fields: &[S]) -> View {
        View {
            sort: fields
                .iter()
                .map(|f| SortField::parse(f.as_ref()))
                .collect::<Vec<_>>()
                .into(),
            ..self.clone()
        }
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn sort_fields(&self) -> &[SortField] {
        &self.sort
    }

    /// Runs the query and returns a cursor over its results.
    ///
    /// The cursor holds a read transaction until it is exhausted, closed or
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` for a malformed filter or sort field, or the
    /// key-value store error if the transaction cannot be opened.
    pub fn cursor(&self) -> KvDocResult<Cursor> {
        self.open(self.sort.clone())
    }

    /// Returns the number of documents the view yields.
    pub fn count(&self) -> KvDocResult<usize> {
        let mut cursor = self.open(Arc::new([]))?;
        let mut count = 0;
        while cursor.advance()? {
            count += 1;
        }
        Ok(count)
    }

    /// Returns the first document the view yields.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the view is empty.
    pub fn one<T: Entity>(&self) -> KvDocResult<T> {
        let mut cursor = self.cursor()?;
        match cursor.fetch::<T>()? {
            Some(entity) => Ok(entity),
            None => {
                log::error!("No document in {} matches the query", self.collection.name());
                Err(KvDocError::new(
                    &format!("No document in {} matches the query", self.collection.name()),
                    ErrorKind::NotFound,
                ))
            }
        }
    }

    /// Collects every document the view yields.
    pub fn all<T: Entity>(&self) -> KvDocResult<Vec<T>> {
        let mut cursor = self.cursor()?;
        let mut results = Vec::new();
        while let Some(entity) = cursor.fetch::<T>()? {
            results.push(entity);
        }
        Ok(results)
    }

    /// Appends every document the view yields to `target`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidResultTarget` unless `target` is a [Value::Array].
    pub fn all_into(&self, target: &mut Value) -> KvDocResult<()> {
        if !matches!(target, Value::Array(_)) {
            log::error!("Query results can only be collected into an array, got {}", target.type_name());
            return Err(KvDocError::new(
                &format!(
                    "Query results can only be collected into an array, got {}",
                    target.type_name()
                ),
                ErrorKind::InvalidResultTarget,
            ));
        }

        let mut cursor = self.cursor()?;
        let mut found = Vec::new();
        while let Some(doc) = cursor.fetch::<Document>()? {
            found.push(Value::from(doc));
        }
        if let Some(results) = target.as_array_mut() {
            results.extend(found);
        }
        Ok(())
    }

    fn open(&self, sort: Arc<[SortField]>) -> KvDocResult<Cursor> {
        let store = self.collection.store();
        let tx = store.begin(false).map_err(|e| e.in_operation("find"))?;
        match select(
            &self.collection,
            tx.as_ref(),
            &self.filters,
            sort,
            self.skip,
            self.limit,
        ) {
            Ok(iter) => Ok(Cursor::new(self.collection.name(), tx, iter)),
            Err(err) => {
                if let Err(rollback) = tx.rollback() {
                    log::warn!("Rollback after failed query failed: {}", rollback);
                }
                Err(err.in_operation("find"))
            }
        }
    }
}

/// Builds the iterator chain answering a filter list inside `tx`.
///
/// The list is answered from secondary indexes when every filter is a plain
/// string equality tree over indexed fields, otherwise by a full scan of the
/// primary bucket. A sort, when present, wraps the selecting iterator.
pub(crate) fn select(
    collection: &Collection,
    tx: &dyn KvTransaction,
    filters: &[Filter],
    sort: Arc<[SortField]>,
    skip: usize,
    limit: usize,
) -> KvDocResult<Box<dyn KvIter>> {
    let predicate = make_predicate(filters)?;
    for field in sort.iter() {
        field.validate()?;
    }

    let bucket = collection.primary_bucket(tx)?;
    let lookup = Lookup::new(tx, collection.index());
    let selected: Box<dyn KvIter> = match lookup.plan(filters)? {
        Some(ids) => {
            log::debug!(
                "Answering query on {} from indexes with {} candidate ids",
                collection.name(),
                ids.len()
            );
            Box::new(KeysIter::new(bucket.cursor()?, ids, skip, limit))
        }
        None => {
            log::debug!("Answering query on {} with a full scan", collection.name());
            Box::new(FilterIter::new(bucket.cursor()?, predicate, skip, limit))
        }
    };

    if sort.is_empty() {
        Ok(selected)
    } else {
        Ok(Box::new(SortIter::new(selected, sort)))
    }
}
