//! Monofile Merge - source registry and single-file merge engine
//!
//! The registry holds one [`SourceUnit`](monofile_core::SourceUnit) per
//! tracked `.java` file. Every mutation is followed by a merge pass that
//! rewrites the output file from the registry's current contents.

mod error;
mod merger;
mod registry;

pub use error::{MergeError, Result};
pub use merger::{
    collect_imports, shortest_namespace, MergeEngine, MergeOptions, MergeOutcome, MergedSource,
    Units,
};
pub use registry::SourceRegistry;
