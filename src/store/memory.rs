//! In-process store backed by Moka.

use std::sync::Arc;

use moka::sync::Cache;

use crate::error::StoreError;

use super::KeyValueStore;

/// Configuration for a [`MemoryStore`].
///
/// The store is the only copy of the translations between file changes, so it is
/// unbounded unless a capacity is set explicitly. A bounded store may evict entries.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Maximum number of entries held, `None` for no limit.
    pub max_capacity: Option<u64>,
}

impl StoreConfig {
    /// Create a store config with the given max capacity.
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            max_capacity: Some(max_capacity),
        }
    }
}

/// Thread-safe string store living in the current process.
///
/// Cloning is cheap and shares the same underlying cache.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Cache<String, String>>,
}

impl MemoryStore {
    /// Create a store with the given config.
    pub fn new(config: StoreConfig) -> Self {
        let mut builder = Cache::builder();

        if let Some(max_capacity) = config.max_capacity {
            builder = builder.max_capacity(max_capacity);
        }

        Self {
            inner: Arc::new(builder.build()),
        }
    }

    /// Number of entries currently held.
    ///
    /// Note: This may lag behind concurrent writes.
    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl KeyValueStore for MemoryStore {
    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.get(key))
    }

    fn set_string(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.invalidate(key);
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entry_count", &self.inner.entry_count())
            .finish()
    }
}
