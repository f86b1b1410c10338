//! Source unit model.
//!
//! A SourceUnit is the registry's record for one tracked `.java` file.

use crate::node::{ParsedUnit, TypeDecl};
use std::path::{Path, PathBuf};

/// One tracked source file and the result of its last successful parse.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    /// Absolute path, the registry key.
    pub path: PathBuf,

    /// Declared package.
    pub namespace: Option<String>,

    /// Name of the first top-level type declaration.
    pub type_name: Option<String>,

    /// Whether the unit declares `public static ... main`.
    pub is_entry: bool,

    /// Full parse result. Replaced wholesale on every re-parse.
    pub parsed: ParsedUnit,
}

impl SourceUnit {
    /// Builds a unit from a fresh parse.
    ///
    /// Every field derived from the parse is recomputed here, so a re-parse
    /// never inherits a stale package, type name, or entry flag.
    pub fn from_parsed(path: impl Into<PathBuf>, parsed: ParsedUnit) -> Self {
        let type_name = parsed.types.first().map(|t| t.name.clone());
        Self {
            path: path.into(),
            namespace: parsed.namespace.clone(),
            type_name,
            is_entry: parsed.has_entry,
            parsed,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The first top-level type declaration, the one that gets merged.
    pub fn primary_type(&self) -> Option<&TypeDecl> {
        self.parsed.types.first()
    }

    /// `namespace.typeName`, the import other units would use to reach this one.
    pub fn qualified_name(&self) -> Option<String> {
        match (&self.namespace, &self.type_name) {
            (Some(ns), Some(name)) => Some(format!("{}.{}", ns, name)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::TypeKind;

    fn parsed(namespace: Option<&str>, types: &[&str], has_entry: bool) -> ParsedUnit {
        ParsedUnit {
            namespace: namespace.map(String::from),
            imports: Vec::new(),
            types: types
                .iter()
                .map(|name| TypeDecl {
                    name: name.to_string(),
                    kind: TypeKind::Class,
                    text: format!("class {} {{}}", name),
                    visibility: None,
                })
                .collect(),
            has_entry,
        }
    }

    #[test]
    fn test_from_parsed_takes_first_type() {
        let parsed = parsed(Some("p"), &["Main", "Other"], true);
        let unit = SourceUnit::from_parsed("/src/A.java", parsed);
        assert_eq!(unit.type_name.as_deref(), Some("Main"));
        assert_eq!(unit.qualified_name().as_deref(), Some("p.Main"));
        assert!(unit.is_entry);
    }

    #[test]
    fn test_qualified_name_needs_package() {
        let unit = SourceUnit::from_parsed("/src/A.java", parsed(None, &["Main"], false));
        assert_eq!(unit.qualified_name(), None);
    }

    #[test]
    fn test_no_types() {
        let unit = SourceUnit::from_parsed("/src/A.java", parsed(Some("p"), &[], false));
        assert!(unit.primary_type().is_none());
        assert_eq!(unit.qualified_name(), None);
    }
}
