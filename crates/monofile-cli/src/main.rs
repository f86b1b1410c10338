//! Monofile CLI - Command-line interface for Monofile
//!
//! Watches a Java source tree and keeps a single merged file up to date,
//! for judges and submission systems that only accept one file.

use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "monofile")]
#[command(author = "Monofile Contributors")]
#[command(version)]
#[command(about = "Merge a tree of Java files into one, on every change", long_about = None)]
struct Cli {
    /// Directory to watch
    dir: PathBuf,

    /// Output file
    #[arg(short, long)]
    output: PathBuf,

    /// Turn on debug logs
    #[arg(short, long)]
    debug: bool,

    /// Merge once and exit instead of watching
    #[arg(long)]
    once: bool,

    /// Strip `public` from every merged type, not only the entry type
    #[arg(long)]
    strip_all_public: bool,

    /// Follow symbolic links when walking the tree
    #[arg(long)]
    follow_symlinks: bool,
}

fn main() {
    let cli = Cli::parse();

    // Set up logging. RUST_LOG wins unless --debug is given.
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(filter)
        .init();

    let args = commands::WatchArgs {
        dir: cli.dir,
        output: cli.output,
        once: cli.once,
        strip_all_public: cli.strip_all_public,
        follow_symlinks: cli.follow_symlinks,
    };

    if let Err(e) = commands::watch(&args) {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
