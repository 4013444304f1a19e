//! Stored key conventions.

use crate::error::StoreError;

use super::KeyValueStore;

/// Key of a single translated string.
pub fn value_key(namespace: &str, culture: &str, key: &str) -> String {
    format!("{}.{}.{}", namespace, culture, key)
}

/// Key of the index listing every key of one (namespace, culture) file.
pub fn key_index_key(namespace: &str, culture: &str) -> String {
    format!("keys_{}.{}", namespace, culture)
}

/// Read and decode a key index.
pub fn read_key_index(
    store: &dyn KeyValueStore,
    namespace: &str,
    culture: &str,
) -> Result<Option<Vec<String>>, StoreError> {
    let index_key = key_index_key(namespace, culture);
    let Some(raw) = store.get_string(&index_key)? else {
        return Ok(None);
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| StoreError::Corrupt {
            key: index_key,
            message: e.to_string(),
        })
}

/// Encode and write a key index.
pub fn write_key_index(
    store: &dyn KeyValueStore,
    namespace: &str,
    culture: &str,
    keys: &[String],
) -> Result<(), StoreError> {
    let index_key = key_index_key(namespace, culture);
    let encoded = serde_json::to_string(keys).map_err(|e| StoreError::Corrupt {
        key: index_key.clone(),
        message: e.to_string(),
    })?;
    store.set_string(&index_key, &encoded)
}
