//! Synchronizing one parsed file into the store.

use std::collections::HashSet;

use tracing::debug;

use crate::error::StoreError;
use crate::reader::{ResourceFile, TranslationEntries};
use crate::store::{self, KeyValueStore};

/// What a reconciliation changed, by file key.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
}

/// Write every entry of `entries`, prune keys the file no longer has, then publish the
/// new key index.
///
/// Not transactional: entries written before a store error stay written, and the key
/// index is only replaced once every entry write succeeded.
pub fn apply(
    store: &dyn KeyValueStore,
    file: &ResourceFile,
    entries: &TranslationEntries,
) -> Result<SyncReport, StoreError> {
    let namespace = file.namespace.as_str();
    let culture = file.culture.name();
    let previous_keys = store::read_key_index(store, namespace, culture)?;

    let mut report = SyncReport::default();
    for (key, value) in &entries.0 {
        let full_key = store::value_key(namespace, culture, key);
        match store.get_string(&full_key)? {
            None => report.added.push(key.clone()),
            Some(existing) if !existing.eq_ignore_ascii_case(value) => report.updated.push(key.clone()),
            Some(_) => {}
        }
        store.set_string(&full_key, value)?;
    }

    let new_keys: Vec<String> = entries.keys().map(str::to_string).collect();
    if let Some(previous_keys) = previous_keys {
        let current: HashSet<&str> = entries.keys().collect();
        for stale in previous_keys.into_iter().filter(|k| !current.contains(k.as_str())) {
            store.remove(&store::value_key(namespace, culture, &stale))?;
            report.removed.push(stale);
        }
    }

    store::write_key_index(store, namespace, culture, &new_keys)?;
    debug!("Synchronized {} keys for {}", new_keys.len(), file);

    Ok(report)
}

/// Remove every key indexed for `file`, and the index itself.
///
/// Returns the removed keys.
pub fn purge(store: &dyn KeyValueStore, file: &ResourceFile) -> Result<Vec<String>, StoreError> {
    let namespace = file.namespace.as_str();
    let culture = file.culture.name();

    let Some(keys) = store::read_key_index(store, namespace, culture)? else {
        return Ok(Vec::new());
    };

    for key in &keys {
        store.remove(&store::value_key(namespace, culture, key))?;
    }
    store.remove(&store::key_index_key(namespace, culture))?;

    Ok(keys)
}
