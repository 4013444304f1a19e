//! Translating file-system notifications into refresh jobs.

use std::path::{Path, PathBuf};

use globset::GlobMatcher;
use notify::event::{ModifyKind, RenameMode};
use notify::{ErrorKind, Event, EventKind};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Unit of work for the refresh workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshJob {
    /// A file was created or changed.
    Reload(PathBuf),
    /// A file was deleted.
    Remove(PathBuf),
    /// A file was renamed; reload the new path, then remove the old one.
    Rename { from: PathBuf, to: PathBuf },
    /// Events may have been lost; compare the directory with what is tracked.
    Rescan,
    /// The watch itself was lost and must be re-established.
    Resubscribe,
}

pub fn is_resource(matcher: &GlobMatcher, path: &Path) -> bool {
    path.file_name().is_some_and(|name| matcher.is_match(name))
}

/// Map one notification to the jobs it implies.
///
/// Paths whose file name does not match the resource pattern are ignored. A rename
/// with only one matching side degrades to a reload or a removal.
pub fn jobs_for_event(event: &Event, matcher: &GlobMatcher) -> Vec<RefreshJob> {
    if event.need_rescan() {
        return vec![RefreshJob::Rescan];
    }

    let matching = move || event.paths.iter().filter(move |p| is_resource(matcher, p)).cloned();

    match event.kind {
        EventKind::Create(_) => {
            matching()
                .inspect(|p| info!("New resource file detected: {}", p.display()))
                .map(RefreshJob::Reload)
                .collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let [from, to] = event.paths.as_slice() else {
                return Vec::new();
            };
            info!("Resource file has been renamed from {} to {}", from.display(), to.display());
            match (is_resource(matcher, from), is_resource(matcher, to)) {
                (true, true) => vec![RefreshJob::Rename {
                    from: from.clone(),
                    to: to.clone(),
                }],
                (true, false) => vec![RefreshJob::Remove(from.clone())],
                (false, true) => vec![RefreshJob::Reload(to.clone())],
                (false, false) => Vec::new(),
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => matching().map(RefreshJob::Remove).collect(),
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) => {
            matching()
                .inspect(|p| info!("Resource file has changed: {}", p.display()))
                .map(RefreshJob::Reload)
                .collect()
        }
        EventKind::Remove(_) => {
            matching()
                .inspect(|p| info!("Resource file {} has been removed", p.display()))
                .map(RefreshJob::Remove)
                .collect()
        }
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

/// Whether a watcher error means the watch is gone rather than a transient hiccup.
pub fn is_watch_lost(err: &notify::Error) -> bool {
    matches!(
        err.kind,
        ErrorKind::Io(_) | ErrorKind::PathNotFound | ErrorKind::WatchNotFound
    )
}

/// Event handler installed on the OS watcher.
///
/// Runs on the watcher's own thread, so it may block on a full queue.
pub fn forward(result: notify::Result<Event>, matcher: &GlobMatcher, queue: &mpsc::Sender<RefreshJob>) {
    let jobs = match result {
        Ok(event) => jobs_for_event(&event, matcher),
        Err(e) => {
            error!("Error in resource file system watcher: {}", e);
            if is_watch_lost(&e) {
                vec![RefreshJob::Resubscribe]
            } else {
                vec![RefreshJob::Rescan]
            }
        }
    };

    for job in jobs {
        if queue.blocking_send(job).is_err() {
            debug!("Refresh queue closed, dropping watcher event");
            return;
        }
    }
}
