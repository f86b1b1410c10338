use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MergeError>;

#[derive(Error, Debug)]
pub enum MergeError {
    /// The merged file could not be written. The previous output, if any,
    /// is still in place because writes go through a temporary file.
    #[error("failed to write merged output '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MergeError {
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
