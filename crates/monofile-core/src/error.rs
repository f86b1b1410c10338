//! Error types for the parsing module.
//!
//! We keep errors simple and actionable. Each variant tells you
//! exactly what went wrong and (usually) where.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience type for functions that can fail during parsing.
pub type Result<T> = std::result::Result<T, ParseError>;

/// One syntax problem reported by Tree-sitter.
///
/// Lines and columns are 1-indexed, like editors show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxProblem {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl fmt::Display for SyntaxProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

/// Things that can go wrong when parsing source files.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Couldn't read the file from disk.
    #[error("failed to read file '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File extension doesn't map to any supported language.
    #[error("unsupported language for file '{0}'")]
    UnsupportedLanguage(PathBuf),

    /// Tree-sitter itself could not be set up or produced no tree.
    #[error("parser error: {0}")]
    ParserError(String),

    /// The source has syntax errors. Tree-sitter always recovers,
    /// but a recovered tree is not something we want to merge.
    #[error("{} syntax problem(s), first at {}", .problems.len(), first_problem(.problems))]
    Syntax { problems: Vec<SyntaxProblem> },

    /// The file exists but is empty. Editors often create the file
    /// before writing it, so callers usually just wait for the next write.
    #[error("file is empty: '{0}'")]
    EmptyFile(PathBuf),
}

impl ParseError {
    /// Creates an IO error with the path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }
}

fn first_problem(problems: &[SyntaxProblem]) -> String {
    problems
        .first()
        .map(ToString::to_string)
        .unwrap_or_else(|| "<unknown>".into())
}
