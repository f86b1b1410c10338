//! Language parsers module.
//!
//! Java is the only language merged today, but the extraction logic sits
//! behind a trait so the parse entry points don't care which grammar runs.

mod java;

pub use java::JavaParser;

use crate::node::ParsedUnit;
use std::path::Path;

/// Trait for language-specific parsing logic.
///
/// Provides the Tree-sitter language and the extraction logic that turns
/// a syntax tree into a ParsedUnit.
pub trait LanguageParser: Send + Sync {
    /// Returns the Tree-sitter language for this parser.
    fn language(&self) -> tree_sitter::Language;

    /// File extensions this parser handles.
    fn extensions(&self) -> &[&str];

    /// Extracts the package, imports, top-level types and entry flag.
    fn extract_unit(&self, tree: &tree_sitter::Tree, source: &str) -> ParsedUnit;
}

/// Gets a parser for the given file extension.
///
/// Returns None if we don't support this extension.
pub fn get_parser(extension: &str) -> Option<Box<dyn LanguageParser>> {
    match extension {
        "java" => Some(Box::new(JavaParser)),
        _ => None,
    }
}

/// Lists all supported file extensions.
pub fn supported_extensions() -> &'static [&'static str] {
    &["java"]
}

/// Checks if a file extension is supported.
pub fn is_supported(extension: &str) -> bool {
    get_parser(extension).is_some()
}

/// Pure extension check: is this path something we merge?
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(is_supported)
        .unwrap_or(false)
}
