//! Translation cache refresher.
//!
//! Keeps the store in sync with a directory of `{namespace}.{culture}.json` files.
//!
//! ## Architecture
//!
//! - The OS watcher thread maps notifications to [`RefreshJob`]s and pushes them onto a
//!   bounded queue
//! - A small pool of workers drains the queue; reloads of distinct files run in parallel
//! - A per-path debounce gate coalesces bursts, content hashes suppress no-op reloads
//! - Reconciliation writes entries, prunes stale keys, then publishes the key index
//!
//! ## Usage
//!
//! ```rust,ignore
//! let refresher = ResourceCacheRefresher::new(config.refresh.clone(), store.clone())?;
//! refresher.start().await?;
//! // ...
//! refresher.stop();
//! ```

mod reconcile;
mod tracking;
mod watcher;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use globset::{Glob, GlobMatcher};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tracing::{debug, error, info, warn};

pub use reconcile::SyncReport;
pub use tracking::FileTrackingRecord;
pub use watcher::RefreshJob;

use crate::checksum::compute_checksum;
use crate::config::RefreshSettings;
use crate::error::RefreshError;
use crate::reader::{ResourceFile, parse_translations};
use crate::store::{self, SharedStore};
use tracking::{DebounceGate, FileTracker};

/// Re-watch attempts after the watch was lost.
const RESUBSCRIBE_ATTEMPTS: u32 = 5;
const RESUBSCRIBE_INITIAL_DELAY: Duration = Duration::from_secs(1);
const RESUBSCRIBE_MAX_DELAY: Duration = Duration::from_secs(30);

/// Result of one reload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Coalesced into a recent reload of the same file.
    Skipped,
    /// Content hash matches the last synchronized content.
    Unchanged,
    /// Unreadable file, missing culture suffix or store failure.
    Failed,
    /// The file parsed to zero entries; existing keys were kept.
    Empty,
    Applied(SyncReport),
}

/// Live watch: the OS watcher and the queue feeding the workers.
struct WatchHandle {
    watcher: RecommendedWatcher,
    queue: mpsc::Sender<RefreshJob>,
}

struct RefresherInner {
    settings: RefreshSettings,
    store: SharedStore,
    matcher: GlobMatcher,
    gate: DebounceGate,
    tracker: FileTracker,
    enabled: AtomicBool,
    watch: parking_lot::Mutex<Option<WatchHandle>>,
}

/// Watches a resource directory and mirrors its translation files into the store.
///
/// Cloning is cheap; clones share the same watch and tracking state.
#[derive(Clone)]
pub struct ResourceCacheRefresher {
    inner: Arc<RefresherInner>,
}

impl ResourceCacheRefresher {
    /// Create a refresher. Nothing is read or watched until [`start`](Self::start).
    pub fn new(mut settings: RefreshSettings, store: SharedStore) -> Result<Self, RefreshError> {
        let matcher = Glob::new(&settings.pattern)
            .map_err(|source| RefreshError::Pattern {
                pattern: settings.pattern.clone(),
                source,
            })?
            .compile_matcher();

        // Watcher events carry absolute paths
        if let Ok(canonical) = std::fs::canonicalize(&settings.directory) {
            settings.directory = canonical;
        }

        Ok(Self {
            inner: Arc::new(RefresherInner {
                gate: DebounceGate::new(settings.quiet_interval),
                settings,
                store,
                matcher,
                tracker: FileTracker::default(),
                enabled: AtomicBool::new(false),
                watch: parking_lot::Mutex::new(None),
            }),
        })
    }

    /// The watched directory.
    pub fn directory(&self) -> &Path {
        &self.inner.settings.directory
    }

    /// Load every matching file, then watch the directory for changes.
    ///
    /// Fails when the directory does not exist or the watch cannot be established; in
    /// the latter case the initial load has already happened.
    pub async fn start(&self) -> Result<(), RefreshError> {
        let inner = &self.inner;
        if inner.watch.lock().is_some() {
            debug!("Refresher for {} already started", self.directory().display());
            return Ok(());
        }

        self.load_all().await?;
        info!("Starting to watch directory {}", self.directory().display());

        let (queue, jobs) = mpsc::channel(inner.settings.queue_capacity);
        inner.enabled.store(true, Ordering::SeqCst);
        let watcher = match inner.subscribe(queue.clone()) {
            Ok(watcher) => watcher,
            Err(e) => {
                inner.enabled.store(false, Ordering::SeqCst);
                error!("Unable to watch {}: {}", self.directory().display(), e);
                return Err(e);
            }
        };

        let jobs = Arc::new(AsyncMutex::new(jobs));
        for id in 0..inner.settings.workers {
            tokio::spawn(run_worker(id, Arc::clone(inner), Arc::clone(&jobs)));
        }

        *inner.watch.lock() = Some(WatchHandle { watcher, queue });
        Ok(())
    }

    /// Synchronize every matching file present now, without debounce or settle delay.
    ///
    /// Individual failures are logged and do not stop the remaining files. Returns the
    /// number of files whose content was applied.
    pub async fn load_all(&self) -> Result<usize, RefreshError> {
        let inner = &self.inner;
        let directory = self.directory();
        if !directory.is_dir() {
            error!("Resource location {} does not exist", directory.display());
            return Err(RefreshError::MissingDirectory(directory.to_path_buf()));
        }

        let files = match inner.list_files() {
            Ok(files) => files,
            Err(e) => {
                error!("Unhandled error filling initial cache: {}", e);
                return Err(e);
            }
        };

        let mut applied = 0;
        for path in &files {
            if let ReloadOutcome::Applied(_) = inner.reload(path, true).await {
                applied += 1;
            }
        }

        info!("Loaded {} of {} resource files from {}", applied, files.len(), directory.display());
        Ok(applied)
    }

    /// Stop watching. Reloads already running are allowed to finish.
    ///
    /// Idempotent; teardown errors are ignored.
    pub fn stop(&self) {
        let inner = &self.inner;
        inner.enabled.store(false, Ordering::SeqCst);

        let Some(mut handle) = inner.watch.lock().take() else {
            return;
        };

        info!("Stopping watch of directory {}", self.directory().display());
        if let Err(e) = handle.watcher.unwatch(&inner.settings.directory) {
            debug!("Ignoring watcher teardown error: {}", e);
        }
    }

    /// Whether file events are currently being processed.
    pub fn is_watching(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    /// Snapshot of the tracking records, sorted by path.
    pub fn tracked_files(&self) -> Vec<(PathBuf, FileTrackingRecord)> {
        self.inner.tracker.snapshot()
    }
}

impl std::fmt::Debug for ResourceCacheRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCacheRefresher")
            .field("directory", &self.inner.settings.directory)
            .field("watching", &self.is_watching())
            .finish()
    }
}

/// Drain the job queue until every sender is gone.
async fn run_worker(
    id: usize,
    inner: Arc<RefresherInner>,
    jobs: Arc<AsyncMutex<mpsc::Receiver<RefreshJob>>>,
) {
    debug!("Refresh worker {} started", id);
    loop {
        let job = jobs.lock().await.recv().await;
        let Some(job) = job else {
            break;
        };

        if !inner.enabled.load(Ordering::SeqCst) {
            debug!("Refresher stopped, discarding {:?}", job);
            continue;
        }
        inner.handle(job).await;
    }
    debug!("Refresh worker {} exiting", id);
}

impl RefresherInner {
    async fn handle(&self, job: RefreshJob) {
        match job {
            RefreshJob::Reload(path) => {
                self.reload(&path, false).await;
            }
            RefreshJob::Remove(path) => self.remove(&path),
            RefreshJob::Rename { from, to } => {
                self.reload(&to, false).await;
                self.remove(&from);
            }
            RefreshJob::Rescan => self.rescan().await,
            RefreshJob::Resubscribe => self.resubscribe().await,
        }
    }

    /// Reload one file.
    ///
    /// Initial loads bypass the debounce gate and the settle delay.
    async fn reload(&self, path: &Path, initial: bool) -> ReloadOutcome {
        let Some(file) = ResourceFile::from_path(path) else {
            warn!("Resource file {} has no culture suffix, skipping", path.display());
            return ReloadOutcome::Failed;
        };

        if !self.gate.try_enter(path, initial) {
            info!(
                "{} was last updated less than {:?} ago, skipping update",
                path.display(),
                self.settings.quiet_interval
            );
            return ReloadOutcome::Skipped;
        }

        if !initial && !self.settings.settle_delay.is_zero() {
            tokio::time::sleep(self.settings.settle_delay).await;
        }

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(source) => {
                let e = RefreshError::Io {
                    path: path.to_path_buf(),
                    source,
                };
                error!("Unable to compute file hash of {}: {}", path.display(), e);
                return ReloadOutcome::Failed;
            }
        };

        let hash = compute_checksum(&bytes);
        let previous = self.tracker.hash(path);
        if previous.as_deref() == Some(hash.as_str()) {
            if self.index_present(&file) {
                debug!("Resource file {} is unchanged", path.display());
                return ReloadOutcome::Unchanged;
            }
            warn!("Key index of {} is missing from the store, reloading {}", file, path.display());
        }
        if previous.is_some() {
            info!("Resource file {} has a different hash, reloading file", path.display());
        }

        let entries = parse_translations(path, &bytes);
        if entries.is_empty() {
            warn!("Resource file {} contains 0 strings", path.display());
            return ReloadOutcome::Empty;
        }

        match reconcile::apply(self.store.as_ref(), &file, &entries) {
            Ok(report) => {
                self.tracker.record(path, hash);
                log_report(&file, &report, previous.is_some());
                ReloadOutcome::Applied(report)
            }
            Err(e) => {
                error!("Unhandled error processing added/changed file {}: {}", path.display(), e);
                ReloadOutcome::Failed
            }
        }
    }

    /// Whether the store still holds the key index written for `file`.
    fn index_present(&self, file: &ResourceFile) -> bool {
        match store::read_key_index(self.store.as_ref(), &file.namespace, file.culture.name()) {
            Ok(index) => index.is_some(),
            Err(e) => {
                error!("Unable to read key index of {}: {}", file, e);
                false
            }
        }
    }

    /// Forget a file and drop every key it provided.
    fn remove(&self, path: &Path) {
        self.tracker.remove(path);
        self.gate.clear(path);

        let Some(file) = ResourceFile::from_path(path) else {
            return;
        };

        match reconcile::purge(self.store.as_ref(), &file) {
            Ok(keys) if !keys.is_empty() => info!(
                "Removed {} strings from {}, locale {} because file was deleted",
                keys.len(),
                file.namespace,
                file.culture
            ),
            Ok(_) => {}
            Err(e) => error!("Unhandled error processing removed/renamed file {}: {}", path.display(), e),
        }
    }

    /// Bring the store back in line with the directory after events may have been lost.
    async fn rescan(&self) {
        let files = match self.list_files() {
            Ok(files) => files,
            Err(e) => {
                error!("Unable to rescan {}: {}", self.settings.directory.display(), e);
                return;
            }
        };

        info!("Rescanning {} resource files in {}", files.len(), self.settings.directory.display());
        for tracked in self.tracker.paths() {
            if !files.contains(&tracked) {
                self.remove(&tracked);
            }
        }

        // Like the initial load this bypasses the gate; unchanged files stop at the hash check
        futures::future::join_all(files.iter().map(|path| self.reload(path, true))).await;
    }

    /// Re-establish a lost watch with exponential backoff, then rescan.
    async fn resubscribe(&self) {
        let directory = self.settings.directory.display();
        let mut delay = RESUBSCRIBE_INITIAL_DELAY;

        for attempt in 1..=RESUBSCRIBE_ATTEMPTS {
            if !self.enabled.load(Ordering::SeqCst) {
                return;
            }
            let Some(queue) = self.watch.lock().as_ref().map(|h| h.queue.clone()) else {
                return;
            };

            match self.subscribe(queue) {
                Ok(watcher) => {
                    let previous = self
                        .watch
                        .lock()
                        .as_mut()
                        .map(|h| std::mem::replace(&mut h.watcher, watcher));
                    drop(previous);

                    info!("Re-established watch on {} (attempt {})", directory, attempt);
                    self.rescan().await;
                    return;
                }
                Err(e) => {
                    warn!(
                        "Unable to re-watch {} (attempt {}/{}): {}, retrying in {:?}",
                        directory, attempt, RESUBSCRIBE_ATTEMPTS, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(RESUBSCRIBE_MAX_DELAY);
                }
            }
        }

        error!("Giving up watching {} after {} attempts", directory, RESUBSCRIBE_ATTEMPTS);
    }

    fn subscribe(&self, queue: mpsc::Sender<RefreshJob>) -> Result<RecommendedWatcher, RefreshError> {
        let matcher = self.matcher.clone();
        let mut watcher = notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
            watcher::forward(result, &matcher, &queue);
        })?;
        watcher.watch(&self.settings.directory, RecursiveMode::NonRecursive)?;
        Ok(watcher)
    }

    /// Matching files directly inside the directory, sorted.
    fn list_files(&self) -> Result<Vec<PathBuf>, RefreshError> {
        let directory = &self.settings.directory;
        let io = |source| RefreshError::Io {
            path: directory.clone(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(directory).map_err(io)? {
            let path = entry.map_err(io)?.path();
            if path.is_file() && watcher::is_resource(&self.matcher, &path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn log_report(file: &ResourceFile, report: &SyncReport, reloaded: bool) {
    if !reloaded {
        debug!("Loaded {} strings for {}", report.added.len() + report.updated.len(), file);
        return;
    }

    if !report.added.is_empty() {
        info!(
            "Adding {} new strings for {}, locale {}: {}",
            report.added.len(),
            file.namespace,
            file.culture,
            report.added.join(",")
        );
    }
    if !report.updated.is_empty() {
        info!(
            "Updated {} strings for {}, locale {}: {}",
            report.updated.len(),
            file.namespace,
            file.culture,
            report.updated.join(",")
        );
    }
    if !report.removed.is_empty() {
        info!(
            "Removed {} strings from {}, locale {}: {}",
            report.removed.len(),
            file.namespace,
            file.culture,
            report.removed.join(",")
        );
    }
}
