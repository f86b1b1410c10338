//! Merge & serialization engine.
//!
//! Takes the registry's units and produces one Java file: the deduplicated
//! imports, the entry type with its `public` stripped, every other unit's
//! first top-level type, and a generation timestamp.

use crate::error::{MergeError, Result};
use chrono::Local;
use monofile_core::{Import, SourceUnit};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// `14h05:09 (18/10/2026)`
const TIMESTAMP_FORMAT: &str = "%Hh%M:%S (%d/%m/%Y)";

/// The units the engine merges, keyed and ordered by path.
pub type Units = BTreeMap<PathBuf, SourceUnit>;

/// Options for the merge engine.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Where the merged file is written.
    pub output: PathBuf,

    /// Strip `public` from every merged type, not only the entry type.
    pub strip_all_visibility: bool,
}

impl MergeOptions {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            strip_all_visibility: false,
        }
    }
}

/// A rendered merge, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedSource {
    pub content: String,
    /// Number of import lines.
    pub imports: usize,
    /// Number of type declarations, entry included.
    pub types: usize,
}

/// What a merge pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Output rendered (and written, when returned from `merge`).
    Merged(MergedSource),
    /// No unit has a `main` method; nothing written.
    NoEntry,
    /// More than one unit has a `main` method; nothing written.
    AmbiguousEntry(Vec<PathBuf>),
}

impl MergeOutcome {
    pub fn is_merged(&self) -> bool {
        matches!(self, Self::Merged(_))
    }
}

/// Renders and writes the merged file.
#[derive(Debug, Clone)]
pub struct MergeEngine {
    options: MergeOptions,
}

impl MergeEngine {
    pub fn new(options: MergeOptions) -> Self {
        Self { options }
    }

    /// Runs one merge pass and writes the result if there is exactly one entry unit.
    ///
    /// When the pass is skipped the previous output is left untouched.
    pub fn merge(&self, units: &Units) -> Result<MergeOutcome> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let outcome = self.render(units, &timestamp);

        match &outcome {
            MergeOutcome::Merged(merged) => {
                if let Some(namespace) = shortest_namespace(units) {
                    debug!("Merging package {}", namespace);
                }
                info!("Writing file {}", self.options.output.display());
                write_atomic(&self.options.output, &merged.content)?;
            }
            MergeOutcome::NoEntry => {
                debug!("No main class among {} units, skipping merge", units.len());
            }
            MergeOutcome::AmbiguousEntry(paths) => {
                let listed: Vec<_> = paths.iter().map(|p| p.display().to_string()).collect();
                warn!("Several main classes found: {}", listed.join(", "));
            }
        }

        Ok(outcome)
    }

    /// Renders the merged file without touching the disk.
    pub fn render(&self, units: &Units, timestamp: &str) -> MergeOutcome {
        let entry = match select_entry(units) {
            Ok(Some(entry)) => entry,
            Ok(None) => return MergeOutcome::NoEntry,
            Err(paths) => return MergeOutcome::AmbiguousEntry(paths),
        };

        let imports = collect_imports(units);
        let mut content = String::new();
        let mut types = 0;

        for import in &imports {
            content.push_str(import);
            content.push('\n');
        }
        content.push('\n');

        if let Some(decl) = entry.primary_type() {
            content.push_str(&decl.without_visibility());
            types += 1;
        }

        for unit in units.values().filter(|u| !u.is_entry) {
            let Some(decl) = unit.primary_type() else {
                debug!("No type declaration in {}, skipping", unit.path.display());
                continue;
            };

            content.push_str("\n\n");
            if self.options.strip_all_visibility && decl.is_public() {
                content.push_str(&decl.without_visibility());
            } else {
                content.push_str(&decl.text);
            }
            content.push('\n');
            types += 1;
        }

        content.push_str("\n\n");
        content.push_str("// Last generated at ");
        content.push_str(timestamp);

        MergeOutcome::Merged(MergedSource {
            content,
            imports: imports.len(),
            types,
        })
    }
}

/// Finds the single unit declaring `main`.
///
/// `Err` carries every entry unit when there is more than one.
fn select_entry(units: &Units) -> std::result::Result<Option<&SourceUnit>, Vec<PathBuf>> {
    let entries: Vec<&SourceUnit> = units.values().filter(|u| u.is_entry).collect();
    match entries.as_slice() {
        [] => Ok(None),
        [entry] => Ok(Some(*entry)),
        _ => Err(entries.iter().map(|u| u.path.clone()).collect()),
    }
}

/// Union of every unit's imports, minus imports of the merged types themselves.
///
/// Only plain imports can name a merged type; static and wildcard imports
/// always survive. Returned as rendered statements, sorted, one per import.
pub fn collect_imports(units: &Units) -> BTreeSet<String> {
    let local: HashSet<Import> = units
        .values()
        .filter_map(SourceUnit::qualified_name)
        .map(Import::plain)
        .collect();

    units
        .values()
        .flat_map(|u| u.parsed.imports.iter())
        .filter(|i| !local.contains(*i))
        .map(ToString::to_string)
        .collect()
}

/// The shortest declared package across units, if any unit has one.
pub fn shortest_namespace(units: &Units) -> Option<&str> {
    units
        .values()
        .filter_map(|u| u.namespace.as_deref())
        .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
}

/// Writes to a sibling temp file, then renames it over `path`.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(|e| MergeError::write(path, e))?;
    file.write_all(content.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| MergeError::write(path, e))?;
    file.persist(path)
        .map_err(|e| MergeError::write(path, e.error))?;

    Ok(())
}
