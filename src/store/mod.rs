//! Key/value store seam.
//!
//! The refresher writes translations and key indexes through [`KeyValueStore`]; the
//! resolver reads them back. Any backend offering atomic single-key get/set/remove can
//! be plugged in.
//!
//! ## Key layout
//!
//! - `{namespace}.{culture}.{key}` - one translated string
//! - `keys_{namespace}.{culture}` - JSON array of the keys present in the source file

mod keys;
mod memory;

use std::sync::Arc;

pub use keys::{key_index_key, read_key_index, value_key, write_key_index};
pub use memory::{MemoryStore, StoreConfig};

use crate::error::StoreError;

/// String key/value store with per-call atomicity and no transactions.
pub trait KeyValueStore: Send + Sync {
    /// Fetch a value, `None` when absent.
    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or overwrite a value.
    fn set_string(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Store handle shared between the refresher and resolvers.
pub type SharedStore = Arc<dyn KeyValueStore>;
