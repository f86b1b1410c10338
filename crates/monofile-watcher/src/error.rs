//! Error types for watching.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from watcher operations.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("cannot watch {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("cannot resolve watch root {path}: {source}")]
    InvalidRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("watch root {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("event source closed unexpectedly")]
    SourceClosed,
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::InitFailed {
            reason: e.to_string(),
        }
    }
}
