//! jsonloc - JSON file backed string localization.
//!
//! Translation files named `{namespace}.{culture}.json` are mirrored into a key/value
//! store and kept in sync while they change on disk. Resolvers read the store with
//! parent-culture, inherited-namespace and fallback-culture lookups.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `culture` - Culture tags and the request culture context
//! - `store` - Key/value store seam and the Moka-backed in-memory store
//! - `reader` - Translation file naming and parsing
//! - `refresher` - File watching, debouncing and reconciliation into the store
//! - `resolver` - Lookups, enumeration and the resolver factory

pub mod checksum;
pub mod config;
pub mod culture;
pub mod error;
pub mod reader;
pub mod refresher;
pub mod resolver;
pub mod store;

pub use config::{Config, RefreshSettings};
pub use culture::{CultureProvider, CultureTag, RequestCulture};
pub use error::{ConfigError, CultureError, FormatError, RefreshError, StoreError};
pub use refresher::{ReloadOutcome, ResourceCacheRefresher};
pub use resolver::{InheritanceRegistry, LocalizationResolver, LocalizedString, ResolverFactory};
pub use store::{KeyValueStore, MemoryStore, SharedStore, StoreConfig};
