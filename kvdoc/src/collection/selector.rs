use crate::filter::Filter;

/// Targets the documents of an update or delete.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// One document by id. Resolved with a single key lookup.
    Id(String),
    /// Documents matching a filter.
    Filter(Filter),
    /// Every document of the collection. Only valid for delete.
    All,
}

impl From<&str> for Selector {
    fn from(id: &str) -> Self {
        Selector::Id(id.to_string())
    }
}

impl From<String> for Selector {
    fn from(id: String) -> Self {
        Selector::Id(id)
    }
}

impl From<&String> for Selector {
    fn from(id: &String) -> Self {
        Selector::Id(id.clone())
    }
}

impl From<Filter> for Selector {
    fn from(filter: Filter) -> Self {
        Selector::Filter(filter)
    }
}
