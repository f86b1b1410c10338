//! Monofile Watcher - change detection for the watched source tree
//!
//! This crate handles the file system side of things:
//! - Walking the tree and registering every directory
//! - Turning raw notifications into created / modified / deleted changes
//! - Feeding those changes to the source registry, one at a time
//!
//! The blocking wait for events sits behind [`EventSource`], so the
//! detector doesn't care whether changes come from notify or elsewhere.

mod detector;
mod error;
mod watcher;

pub use detector::{ChangeDetector, ScanOptions};
pub use error::WatchError;
pub use watcher::{classify, EventSource, FileChange, FileWatcher};
