use crate::common::KEY_DELIMITER;
use crate::errors::{ErrorKind, KvDocError, KvDocResult};
use std::collections::BTreeSet;

/// The set of document ids stored under one index key.
pub(crate) type IdSet = BTreeSet<String>;

/// Encodes an id set as the value of an index entry.
///
/// Ids are written in ascending order, each followed by [KEY_DELIMITER]. The set
/// is de-duplicated by construction, so the encoding of a given set is unique.
pub(crate) fn encode_ids(ids: &IdSet) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(ids.iter().map(|id| id.len() + 1).sum());
    for id in ids {
        bytes.extend_from_slice(id.as_bytes());
        bytes.push(KEY_DELIMITER);
    }
    bytes
}

/// Decodes the value of an index entry.
///
/// # Errors
///
/// Returns `SerializationError` if an id is not valid UTF-8.
pub(crate) fn decode_ids(bytes: &[u8]) -> KvDocResult<IdSet> {
    bytes
        .split(|b| *b == KEY_DELIMITER)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| {
            String::from_utf8(chunk.to_vec()).map_err(|err| {
                log::error!("Index entry holds a non UTF-8 document id: {}", err);
                KvDocError::new(
                    &format!("Corrupt index entry: {}", err),
                    ErrorKind::SerializationError,
                )
            })
        })
        .collect()
}
