//! Change detection.
//!
//! Keeps a live picture of the watched tree (registered directories and
//! every file seen under them) and turns each filesystem change into the
//! matching registry call. Everything runs on the caller's thread, one
//! change at a time, in delivery order.

use crate::error::WatchError;
use crate::watcher::{EventSource, FileChange};
use monofile_core::is_source_file;
use monofile_merge::SourceRegistry;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

/// Options for walking the watched tree.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Follow symbolic links when walking directories.
    pub follow_symlinks: bool,
}

/// Maps filesystem changes under one root onto a [`SourceRegistry`].
pub struct ChangeDetector<S: EventSource> {
    source: S,
    root: PathBuf,
    options: ScanOptions,

    /// Directories with an active registration.
    watched_dirs: BTreeSet<PathBuf>,

    /// Every file seen under the root, source or not. Needed to tell a
    /// file deletion from a directory deletion after the fact.
    watched_files: BTreeSet<PathBuf>,

    /// Paths never tracked, e.g. the merged output itself.
    ignored: HashSet<PathBuf>,
}

impl<S: EventSource> ChangeDetector<S> {
    /// Creates a detector for `root`, which must be an existing directory.
    pub fn new(source: S, root: &Path, options: ScanOptions) -> Result<Self, WatchError> {
        let root = root.canonicalize().map_err(|e| WatchError::InvalidRoot {
            path: root.to_path_buf(),
            source: e,
        })?;
        if !root.is_dir() {
            return Err(WatchError::NotADirectory(root));
        }

        Ok(Self {
            source,
            root,
            options,
            watched_dirs: BTreeSet::new(),
            watched_files: BTreeSet::new(),
            ignored: HashSet::new(),
        })
    }

    /// Never track `path`, whatever happens to it.
    pub fn ignore(&mut self, path: impl Into<PathBuf>) {
        self.ignored.insert(path.into());
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_watching(&self, dir: &Path) -> bool {
        self.watched_dirs.contains(dir)
    }

    pub fn is_tracked(&self, file: &Path) -> bool {
        self.watched_files.contains(file)
    }

    pub fn watched_dir_count(&self) -> usize {
        self.watched_dirs.len()
    }

    pub fn watched_file_count(&self) -> usize {
        self.watched_files.len()
    }

    /// Registers the root, walks the whole tree, then merges once.
    ///
    /// Failing to register the root is fatal. Anything below it that can't be
    /// listed or registered is logged and skipped.
    pub fn start(&mut self, registry: &mut SourceRegistry) -> Result<(), WatchError> {
        info!("Watching folder {}", self.root.display());
        let root = self.root.clone();

        self.source.watch(&root)?;
        self.watched_dirs.insert(root.clone());

        self.scan(&root, registry);
        debug!(
            "{} files in {} directories are watched at initialization",
            self.watched_files.len(),
            self.watched_dirs.len()
        );

        registry.merge();
        Ok(())
    }

    /// Processes change batches until no directory is left to watch.
    pub fn run(&mut self, registry: &mut SourceRegistry) -> Result<(), WatchError> {
        while !self.watched_dirs.is_empty() {
            let batch = self.source.next_batch().ok_or(WatchError::SourceClosed)?;
            for change in batch {
                self.handle(change, registry);
            }
            self.prune_stale(registry);
        }

        info!("Watch ended, nothing left under {}", self.root.display());
        Ok(())
    }

    /// Applies one change to the tracked tree and the registry.
    pub fn handle(&mut self, change: FileChange, registry: &mut SourceRegistry) {
        if self.ignored.contains(change.path()) {
            trace!("Ignoring {:?}", change);
            return;
        }

        match change {
            FileChange::Created(path) => self.on_created(path, registry),
            FileChange::Modified(path) => self.on_modified(path, registry),
            FileChange::Deleted(path) => self.on_deleted(path, registry),
        }
    }

    fn on_created(&mut self, path: PathBuf, registry: &mut SourceRegistry) {
        if path.is_dir() {
            debug!("Directory created {}", path.display());
            self.scan(&path, registry);
            registry.merge();
            return;
        }

        let is_source = is_source_file(&path);
        trace!("Added file {} - is java? {}", path.display(), is_source);
        self.watched_files.insert(path.clone());
        if is_source {
            registry.add_or_replace(&path, true);
        }
    }

    fn on_modified(&mut self, path: PathBuf, registry: &mut SourceRegistry) {
        if !self.watched_files.contains(&path) {
            return;
        }

        let is_source = is_source_file(&path);
        trace!("Modified file {} - is java? {}", path.display(), is_source);
        if is_source {
            registry.modify(&path);
        }
    }

    fn on_deleted(&mut self, path: PathBuf, registry: &mut SourceRegistry) {
        if self.watched_files.remove(&path) {
            let is_source = is_source_file(&path);
            trace!("Deleted file {} - is java? {}", path.display(), is_source);
            if is_source {
                registry.remove(&path);
            }
            return;
        }

        // Not a file we know, so it was (almost certainly) a directory.
        self.remove_tree(&path, registry);
    }

    /// Forgets every file and registration under `dir`.
    fn remove_tree(&mut self, dir: &Path, registry: &mut SourceRegistry) {
        let files: Vec<PathBuf> = self
            .watched_files
            .iter()
            .filter(|f| f.starts_with(dir))
            .cloned()
            .collect();

        let mut sources = Vec::new();
        for file in files {
            self.watched_files.remove(&file);
            let is_source = is_source_file(&file);
            trace!("Deleted file {} - is java? {}", file.display(), is_source);
            if is_source {
                sources.push(file);
            }
        }
        // One merge for the whole subtree.
        if !sources.is_empty() {
            registry.remove_all(&sources);
        }

        let dirs: Vec<PathBuf> = self
            .watched_dirs
            .iter()
            .filter(|d| d.starts_with(dir))
            .cloned()
            .collect();

        for d in dirs {
            info!("Unregister path {}", d.display());
            self.watched_dirs.remove(&d);
            self.source.unwatch(&d);
        }
    }

    /// Drops registrations whose directory disappeared without an event.
    fn prune_stale(&mut self, registry: &mut SourceRegistry) {
        while let Some(stale) = self.watched_dirs.iter().find(|d| !d.is_dir()).cloned() {
            self.remove_tree(&stale, registry);
        }
    }

    /// Walks `dir`, registering directories and recording files.
    ///
    /// Source files are added to the registry without merging; callers merge
    /// once the walk is done.
    fn scan(&mut self, dir: &Path, registry: &mut SourceRegistry) {
        let mut walker = WalkDir::new(dir)
            .follow_links(self.options.follow_symlinks)
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to list {}: {}", dir.display(), e);
                    continue;
                }
            };

            let path = entry.path();
            if self.ignored.contains(path) {
                continue;
            }

            if entry.file_type().is_dir() {
                if self.watched_dirs.contains(path) {
                    continue;
                }
                if let Err(e) = self.source.watch(path) {
                    warn!("Skipping {}: {}", path.display(), e);
                    walker.skip_current_dir();
                    continue;
                }
                self.watched_dirs.insert(path.to_path_buf());
                continue;
            }

            let is_source = is_source_file(path);
            trace!("Added file {} - is java? {}", path.display(), is_source);
            self.watched_files.insert(path.to_path_buf());
            if is_source {
                registry.add_or_replace(path, false);
            }
        }
    }
}
