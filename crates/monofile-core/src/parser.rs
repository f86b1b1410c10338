//! Parser module - turns a file on disk into a ParsedUnit.
//!
//! This module wraps Tree-sitter. Language detection is automatic based
//! on file extension. Trees with syntax errors are rejected so that a
//! half-typed file never replaces the last good version of a unit.

use crate::error::{ParseError, Result, SyntaxProblem};
use crate::languages::{get_parser, LanguageParser};
use crate::node::ParsedUnit;
use std::fs;
use std::path::Path;
use tracing::trace;

/// Upper bound on problems reported for one file.
const MAX_PROBLEMS: usize = 10;

/// Parses a source file.
///
/// This is the main entry point for parsing. It handles:
/// - Reading the file from disk
/// - Detecting the language from the extension
/// - Parsing with Tree-sitter and rejecting trees with errors
/// - Extracting the package, imports, types and entry point
///
/// # Example
///
/// ```no_run
/// use monofile_core::parse_file;
/// use std::path::Path;
///
/// let unit = parse_file(Path::new("src/Main.java")).unwrap();
/// println!("{} top-level types", unit.types.len());
/// ```
pub fn parse_file(path: &Path) -> Result<ParsedUnit> {
    let parser =
        detect_language(path).ok_or_else(|| ParseError::UnsupportedLanguage(path.to_path_buf()))?;

    let source = fs::read_to_string(path).map_err(|e| ParseError::io(path, e))?;

    if source.trim().is_empty() {
        return Err(ParseError::EmptyFile(path.to_path_buf()));
    }

    trace!("Parsing {}", path.display());
    parse_source(&source, parser.as_ref())
}

/// Parses source code directly (useful for testing or in-memory content).
///
/// You need to provide a language parser explicitly since there's no
/// file extension to detect from.
pub fn parse_source(source: &str, lang_parser: &dyn LanguageParser) -> Result<ParsedUnit> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&lang_parser.language())
        .map_err(|e| ParseError::ParserError(format!("Failed to set language: {}", e)))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ParseError::ParserError("Tree-sitter returned no tree".into()))?;

    let root = tree.root_node();
    if root.has_error() {
        let mut problems = Vec::new();
        collect_problems(&root, source, &mut problems);
        return Err(ParseError::Syntax { problems });
    }

    Ok(lang_parser.extract_unit(&tree, source))
}

/// Detects the programming language from a file path.
///
/// Returns None if we don't support the file's extension.
pub fn detect_language(path: &Path) -> Option<Box<dyn LanguageParser>> {
    let extension = path.extension()?.to_str()?;
    get_parser(extension)
}

/// Walks the subtrees flagged with errors and records ERROR / MISSING nodes.
fn collect_problems(node: &tree_sitter::Node, source: &str, problems: &mut Vec<SyntaxProblem>) {
    if problems.len() >= MAX_PROBLEMS {
        return;
    }

    let position = node.start_position();
    let line = position.row as u32 + 1;
    let column = position.column as u32 + 1;

    if node.is_missing() {
        problems.push(SyntaxProblem {
            line,
            column,
            message: format!("missing `{}`", node.kind()),
        });
        return;
    }

    if node.is_error() {
        let snippet: String = source[node.byte_range()]
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .take(40)
            .collect();
        problems.push(SyntaxProblem {
            line,
            column,
            message: format!("unexpected `{}`", snippet),
        });
        return;
    }

    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if child.has_error() {
                collect_problems(&child, source, problems);
            }
        }
    }
}
