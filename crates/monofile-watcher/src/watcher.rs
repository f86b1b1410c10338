//! Filesystem event sources.
//!
//! The change detector only needs three things from the platform: register
//! a directory, drop a registration, and block until the next batch of
//! changes. [`EventSource`] captures that, and [`FileWatcher`] implements it
//! on top of the notify crate.

use crate::error::WatchError;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use tracing::{debug, trace, warn};

/// Type of file change detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Created(PathBuf),
    Modified(PathBuf),
    Deleted(PathBuf),
}

impl FileChange {
    /// The path the change applies to.
    pub fn path(&self) -> &Path {
        match self {
            Self::Created(p) | Self::Modified(p) | Self::Deleted(p) => p,
        }
    }
}

/// Where filesystem changes come from.
pub trait EventSource {
    /// Starts delivering changes for the direct children of `dir`.
    fn watch(&mut self, dir: &Path) -> Result<(), WatchError>;

    /// Stops watching `dir`. The directory may already be gone.
    fn unwatch(&mut self, dir: &Path);

    /// Blocks until at least one raw event arrives, then returns everything
    /// pending. `None` means the source is closed and nothing more will come.
    fn next_batch(&mut self) -> Option<Vec<FileChange>>;
}

/// Watches directories through the platform's notification API.
///
/// Each directory is registered on its own (non-recursively); the change
/// detector walks new subtrees and registers them as they appear.
pub struct FileWatcher {
    watcher: notify::RecommendedWatcher,
    receiver: Receiver<notify::Result<Event>>,
    renames: RenameFilter,
}

impl FileWatcher {
    pub fn new() -> Result<Self, WatchError> {
        let (tx, rx) = channel();

        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if tx.send(res).is_err() {
                warn!("Failed to send file change event");
            }
        })?;

        Ok(Self {
            watcher,
            receiver: rx,
            renames: RenameFilter::default(),
        })
    }
}

impl EventSource for FileWatcher {
    fn watch(&mut self, dir: &Path) -> Result<(), WatchError> {
        self.watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })?;
        debug!("Registered watch on {}", dir.display());
        Ok(())
    }

    fn unwatch(&mut self, dir: &Path) {
        // The kernel usually drops the watch itself once the directory is gone.
        if let Err(e) = self.watcher.unwatch(dir) {
            trace!("Unwatch {}: {}", dir.display(), e);
        }
    }

    fn next_batch(&mut self) -> Option<Vec<FileChange>> {
        let first = self.receiver.recv().ok()?;

        let mut batch = Vec::new();
        for res in std::iter::once(first).chain(self.receiver.try_iter()) {
            match res {
                Ok(event) => {
                    trace!("Event kind: {:?} - paths: {:?}", event.kind, event.paths);
                    if self.renames.is_duplicate(&event) {
                        trace!("Dropping paired rename for {:?}", event.paths);
                        continue;
                    }
                    batch.extend(classify(&event));
                }
                Err(e) => warn!("Watch error: {}", e),
            }
        }
        Some(batch)
    }
}

/// Drops rename events that only repeat what was already reported.
///
/// inotify reports one rename as a `From` half, a `To` half, and then a
/// `Both` event tying them together, all sharing a tracker cookie. The
/// halves are enough, so a `Both` whose cookie was already seen is skipped.
/// Backends that only send `Both` never hit the filter.
#[derive(Debug, Default)]
struct RenameFilter {
    seen: VecDeque<usize>,
}

impl RenameFilter {
    const MAX_PENDING: usize = 512;

    fn is_duplicate(&mut self, event: &Event) -> bool {
        let (EventKind::Modify(ModifyKind::Name(mode)), Some(cookie)) =
            (&event.kind, event.attrs.tracker())
        else {
            return false;
        };

        match mode {
            RenameMode::From | RenameMode::To => {
                if !self.seen.contains(&cookie) {
                    if self.seen.len() == Self::MAX_PENDING {
                        self.seen.pop_front();
                    }
                    self.seen.push_back(cookie);
                }
                false
            }
            RenameMode::Both => match self.seen.iter().position(|c| *c == cookie) {
                Some(index) => {
                    self.seen.remove(index);
                    true
                }
                None => false,
            },
            _ => false,
        }
    }
}

/// Normalizes a raw notify event into created / modified / deleted changes.
///
/// Renames become a delete of the old path and a create of the new one.
/// Access and metadata-only events carry no content change and are dropped.
pub fn classify(event: &Event) -> Vec<FileChange> {
    let paths = event.paths.iter().cloned();

    match &event.kind {
        EventKind::Create(_) => paths.map(FileChange::Created).collect(),
        EventKind::Remove(_) => paths.map(FileChange::Deleted).collect(),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => paths.map(FileChange::Deleted).collect(),
            RenameMode::To => paths.map(FileChange::Created).collect(),
            RenameMode::Both => match event.paths.as_slice() {
                [from, to] => vec![
                    FileChange::Deleted(from.clone()),
                    FileChange::Created(to.clone()),
                ],
                _ => Vec::new(),
            },
            // Backends that can't tell which side of the rename they saw.
            _ => paths
                .map(|p| {
                    if p.exists() {
                        FileChange::Created(p)
                    } else {
                        FileChange::Deleted(p)
                    }
                })
                .collect(),
        },
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) => paths.map(FileChange::Modified).collect(),
        _ => Vec::new(),
    }
}
