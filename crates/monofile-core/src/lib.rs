//! Monofile Core - Java parsing and the source unit model
//!
//! This crate provides the parse capability the merge engine relies on.
//! It uses Tree-sitter to parse `.java` files and extracts exactly what
//! merging needs: the package, the imports, the top-level type
//! declarations with their source text, and whether a `main` entry point
//! is present.
//!
//! # Example
//!
//! ```no_run
//! use monofile_core::{parse_file, SourceUnit};
//! use std::path::Path;
//!
//! let path = Path::new("src/Main.java");
//! let unit = SourceUnit::from_parsed(path, parse_file(path).unwrap());
//! println!("{:?} entry={}", unit.qualified_name(), unit.is_entry);
//! ```

pub mod error;
pub mod languages;
pub mod node;
pub mod parser;
pub mod unit;

pub use error::{ParseError, Result, SyntaxProblem};
pub use languages::{is_source_file, LanguageParser};
pub use node::{Import, ParsedUnit, TypeDecl, TypeKind};
pub use parser::{detect_language, parse_file, parse_source};
pub use unit::SourceUnit;
