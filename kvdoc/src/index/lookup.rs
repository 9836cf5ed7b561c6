use crate::common::{is_id_field, Value};
use crate::errors::KvDocResult;
use crate::filter::{Condition, Filter};
use crate::index::{CollectionIndex, IdSet};
use crate::store::KvTransaction;

/// Decides whether a filter list can be answered from secondary indexes and, if
/// so, resolves it to the matching document ids.
pub(crate) struct Lookup<'a> {
    tx: &'a dyn KvTransaction,
    index: &'a CollectionIndex,
}

impl<'a> Lookup<'a> {
    pub(crate) fn new(tx: &'a dyn KvTransaction, index: &'a CollectionIndex) -> Lookup<'a> {
        Lookup { tx, index }
    }

    /// Plans a filter list, combined with AND.
    ///
    /// # Returns
    /// * `Ok(Some(ids))` with the ascending matching ids if every filter is suitable
    /// * `Ok(None)` if the list is empty or any filter needs a full scan
    pub(crate) fn plan(&self, filters: &[Filter]) -> KvDocResult<Option<Vec<String>>> {
        if filters.is_empty() {
            return Ok(None);
        }
        for filter in filters {
            if !self.is_suitable(filter)? {
                return Ok(None);
            }
        }

        let mut result: Option<IdSet> = None;
        for filter in filters {
            let ids = self.resolve_keys(filter)?;
            result = Some(match result {
                Some(acc) => intersect(acc, ids),
                None => ids,
            });
            if result.as_ref().is_some_and(IdSet::is_empty) {
                break;
            }
        }
        Ok(result.map(|ids| ids.into_iter().collect()))
    }

    /// Returns true when the whole tree is made of plain string equalities joined by
    /// AND/OR, and every non-`id` field it tests has an index bucket.
    pub(crate) fn is_suitable(&self, filter: &Filter) -> KvDocResult<bool> {
        match filter {
            Filter::Fields(fields) => {
                if fields.is_empty() {
                    return Ok(false);
                }
                for (name, condition) in fields {
                    if !condition.is_string_equality() {
                        return Ok(false);
                    }
                    if !is_id_field(name) && self.index.bucket(self.tx, name)?.is_none() {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Filter::And(filters) | Filter::Or(filters) => {
                if filters.is_empty() {
                    return Ok(false);
                }
                for child in filters {
                    if !self.is_suitable(child)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Filter::Not(_) => Ok(false),
        }
    }

    /// Resolves a suitable filter to the set of matching ids.
    ///
    /// Field-maps and AND intersect the sets of their parts, OR unions them. An
    /// intersection stops as soon as it becomes empty.
    pub(crate) fn resolve_keys(&self, filter: &Filter) -> KvDocResult<IdSet> {
        match filter {
            Filter::Fields(fields) => {
                let mut acc: Option<IdSet> = None;
                for (name, condition) in fields {
                    let ids = self.resolve_field(name, condition)?;
                    let next = match acc {
                        Some(prev) => intersect(prev, ids),
                        None => ids,
                    };
                    if next.is_empty() {
                        return Ok(next);
                    }
                    acc = Some(next);
                }
                Ok(acc.unwrap_or_default())
            }
            Filter::And(filters) => {
                let mut acc: Option<IdSet> = None;
                for child in filters {
                    let ids = self.resolve_keys(child)?;
                    let next = match acc {
                        Some(prev) => intersect(prev, ids),
                        None => ids,
                    };
                    if next.is_empty() {
                        return Ok(next);
                    }
                    acc = Some(next);
                }
                Ok(acc.unwrap_or_default())
            }
            Filter::Or(filters) => {
                let mut acc = IdSet::new();
                for child in filters {
                    acc.extend(self.resolve_keys(child)?);
                }
                Ok(acc)
            }
            Filter::Not(_) => Ok(IdSet::new()),
        }
    }

    fn resolve_field(&self, name: &str, condition: &Condition) -> KvDocResult<IdSet> {
        let Condition::Eq(Value::String(value)) = condition else {
            return Ok(IdSet::new());
        };
        if is_id_field(name) {
            return Ok(IdSet::from([value.clone()]));
        }
        Ok(self
            .index
            .lookup(self.tx, name, value)?
            .unwrap_or_default())
    }
}

fn intersect(a: IdSet, b: IdSet) -> IdSet {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.into_iter().filter(|id| large.contains(id)).collect()
}
