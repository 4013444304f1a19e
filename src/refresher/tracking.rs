//! Per-file tracking records and the debounce gate.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;

/// Last accepted state of one translation file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileTrackingRecord {
    /// Digest of the last content that was parsed and synchronized.
    pub hash: String,
    /// When that content was synchronized.
    pub last_processed: DateTime<Utc>,
}

/// Tracking records keyed by file path.
#[derive(Debug, Default)]
pub struct FileTracker {
    records: DashMap<PathBuf, FileTrackingRecord>,
}

impl FileTracker {
    pub fn hash(&self, path: &Path) -> Option<String> {
        self.records.get(path).map(|r| r.hash.clone())
    }

    pub fn record(&self, path: &Path, hash: String) {
        self.records.insert(
            path.to_path_buf(),
            FileTrackingRecord {
                hash,
                last_processed: Utc::now(),
            },
        );
    }

    pub fn remove(&self, path: &Path) -> Option<FileTrackingRecord> {
        self.records.remove(path).map(|(_, record)| record)
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.records.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn snapshot(&self) -> Vec<(PathBuf, FileTrackingRecord)> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        records.sort_by(|a, b| a.0.cmp(&b.0));
        records
    }
}

/// Coalesces bursts of reloads for the same path.
///
/// Each path owns a slot holding the start time of its last accepted reload. The slot
/// lock is held only while deciding, never across the settle delay or the reload.
#[derive(Debug)]
pub struct DebounceGate {
    quiet_interval: Duration,
    slots: DashMap<PathBuf, Arc<Mutex<Option<Instant>>>>,
}

impl DebounceGate {
    pub fn new(quiet_interval: Duration) -> Self {
        Self {
            quiet_interval,
            slots: DashMap::new(),
        }
    }

    /// Decide whether a reload of `path` may proceed, recording it when it does.
    ///
    /// Initial loads always proceed.
    pub fn try_enter(&self, path: &Path, initial: bool) -> bool {
        let slot = Arc::clone(&self.slots.entry(path.to_path_buf()).or_default());
        let mut last = slot.lock();
        let now = Instant::now();

        if !initial
            && let Some(previous) = *last
            && now.duration_since(previous) < self.quiet_interval
        {
            return false;
        }

        *last = Some(now);
        true
    }

    /// Drop the slot of `path` so the next reload is never coalesced.
    pub fn clear(&self, path: &Path) {
        self.slots.remove(path);
    }
}
