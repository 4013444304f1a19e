//! jsonloc demo host.
//!
//! Loads the resource directory into an in-memory store, keeps it in sync with the files
//! on disk and logs what a resolver sees until Ctrl-C.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use jsonloc::{Config, InheritanceRegistry, MemoryStore, ResolverFactory, ResourceCacheRefresher, StoreConfig};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Namespace enumerated at startup.
const SAMPLE_NAMESPACE: &str = "messages";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jsonloc=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting jsonloc...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");
    info!("Resource directory: {}", config.refresh.directory.display());

    let store = Arc::new(MemoryStore::new(StoreConfig {
        max_capacity: config.store_capacity,
    }));

    let refresher = ResourceCacheRefresher::new(config.refresh.clone(), store.clone())?;
    refresher.start().await?;
    info!("Tracking {} resource files", refresher.tracked_files().len());

    let factory = ResolverFactory::new(store.clone(), InheritanceRegistry::new(), config.fallback_culture.clone());
    let resolver = factory.create(SAMPLE_NAMESPACE);
    for entry in resolver.get_all(true, &config.default_culture, &[]) {
        info!("{}.{}: {} = {}", SAMPLE_NAMESPACE, config.default_culture, entry.name, entry.value);
    }

    info!("Watching for changes, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    refresher.stop();
    info!("Stored entries at shutdown: {}", store.entry_count());
    Ok(())
}
