//! CLI command implementations.

use colored::Colorize;
use monofile_merge::{MergeEngine, MergeOptions, SourceRegistry};
use monofile_watcher::{ChangeDetector, FileWatcher, ScanOptions};
use std::env;
use std::path::{Path, PathBuf};
use tracing::info;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Everything `watch` needs from the command line.
#[derive(Debug, Clone)]
pub struct WatchArgs {
    pub dir: PathBuf,
    pub output: PathBuf,
    pub once: bool,
    pub strip_all_public: bool,
    pub follow_symlinks: bool,
}

/// Scan `dir`, merge, then keep merging on every change until the tree is gone.
pub fn watch(args: &WatchArgs) -> Result<()> {
    let output = resolve_output(&args.output)?;
    info!("Output defined on: {}", output.display());

    let mut merge_options = MergeOptions::new(&output);
    merge_options.strip_all_visibility = args.strip_all_public;
    let mut registry = SourceRegistry::new(MergeEngine::new(merge_options));

    let options = ScanOptions {
        follow_symlinks: args.follow_symlinks,
    };
    let mut detector = ChangeDetector::new(FileWatcher::new()?, &args.dir, options)?;
    detector.ignore(&output);
    detector.start(&mut registry)?;

    println!(
        "{} Tracking {} source files under {}",
        "✓".green(),
        registry.len().to_string().cyan(),
        detector.root().display()
    );

    if args.once {
        return Ok(());
    }

    println!("  Press {} to stop", "Ctrl+C".cyan());
    detector.run(&mut registry)?;
    println!("{} Watched directory is gone, stopping", "✓".green());

    Ok(())
}

/// Makes the output path absolute and resolves symlinks in its directory,
/// so it compares equal to the paths the detector reports.
fn resolve_output(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };

    let resolved = match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|dir| dir.join(name))
            .unwrap_or_else(|_| absolute.clone()),
        _ => absolute,
    };
    Ok(resolved)
}
