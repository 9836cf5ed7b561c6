/// Name of the engine-assigned identifier field.
pub const DOC_ID: &str = "id";

/// Alternative spelling of the identifier field accepted in filters.
pub const DOC_ID_ALIAS: &str = "_id";

/// Name of the creation timestamp field.
pub const DOC_CREATED_AT: &str = "createdAt";

/// Name of the modification timestamp field.
pub const DOC_UPDATED_AT: &str = "updatedAt";

/// Fields owned by the engine rather than by the application.
pub const RESERVED_FIELDS: [&str; 3] = [DOC_ID, DOC_CREATED_AT, DOC_UPDATED_AT];

/// Default prefix of secondary index bucket names.
pub const DEFAULT_INDEX_PREFIX: &str = "idx_";

/// Terminator written after every id in an encoded index entry.
pub const KEY_DELIMITER: u8 = 0;

/// Prefix marking a descending sort field.
pub const DESCENDING_PREFIX: char = '-';

/// Returns true when `name` refers to the identifier pseudo-field.
#[inline]
pub fn is_id_field(name: &str) -> bool {
    name == DOC_ID || name == DOC_ID_ALIAS
}

/// Maps `_id` to `id`, leaving every other field name untouched.
#[inline]
pub fn normalize_field(name: &str) -> &str {
    if name == DOC_ID_ALIAS {
        DOC_ID
    } else {
        name
    }
}
