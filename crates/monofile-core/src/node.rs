//! Parsed representation of one Java compilation unit.
//!
//! A ParsedUnit is our abstraction over the raw Tree-sitter tree. It keeps
//! only what merging needs: the package, the imports, the top-level type
//! declarations with their source text, and whether a `main` entry point
//! was found.

use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

/// The kind of top-level type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
    /// An `@interface` declaration.
    Annotation,
}

impl TypeKind {
    /// Maps a Tree-sitter node kind to a type kind.
    pub fn from_node_kind(kind: &str) -> Option<Self> {
        match kind {
            "class_declaration" => Some(Self::Class),
            "interface_declaration" => Some(Self::Interface),
            "enum_declaration" => Some(Self::Enum),
            "record_declaration" => Some(Self::Record),
            "annotation_type_declaration" => Some(Self::Annotation),
            _ => None,
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Enum => "enum",
            Self::Record => "record",
            Self::Annotation => "annotation",
        };
        write!(f, "{}", s)
    }
}

/// A single import statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Import {
    /// Dotted name without the trailing `.*` (e.g. "java.util.List").
    pub path: String,
    pub is_static: bool,
    pub is_wildcard: bool,
}

impl Import {
    /// A plain `import a.b.C;`.
    pub fn plain(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_static: false,
            is_wildcard: false,
        }
    }
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("import ")?;
        if self.is_static {
            f.write_str("static ")?;
        }
        f.write_str(&self.path)?;
        if self.is_wildcard {
            f.write_str(".*")?;
        }
        f.write_str(";")
    }
}

/// A top-level type declaration and its exact source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    /// Source text of the whole declaration, modifiers through closing brace.
    pub text: String,
    /// Byte span in `text` of the `public` modifier plus the whitespace after it.
    pub visibility: Option<Range<usize>>,
}

impl TypeDecl {
    /// Whether the declaration carries a `public` modifier.
    pub fn is_public(&self) -> bool {
        self.visibility.is_some()
    }

    /// Returns the declaration with its `public` modifier token removed.
    ///
    /// Annotations and other modifiers are left in place.
    pub fn without_visibility(&self) -> Cow<'_, str> {
        match &self.visibility {
            Some(span) => {
                let mut text = String::with_capacity(self.text.len() - span.len());
                text.push_str(&self.text[..span.start]);
                text.push_str(&self.text[span.end..]);
                Cow::Owned(text)
            }
            None => Cow::Borrowed(&self.text),
        }
    }
}

/// Everything extracted from one compilation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUnit {
    /// Declared package, if any.
    pub namespace: Option<String>,
    /// Imports in source order.
    pub imports: Vec<Import>,
    /// Top-level type declarations in source order.
    pub types: Vec<TypeDecl>,
    /// True if some method is `public static ... main`.
    pub has_entry: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(text: &str, visibility: Option<Range<usize>>) -> TypeDecl {
        TypeDecl {
            name: "Main".into(),
            kind: TypeKind::Class,
            text: text.into(),
            visibility,
        }
    }

    #[test]
    fn test_without_visibility_removes_span() {
        let d = decl("public final class Main {}", Some(0..7));
        assert_eq!(d.without_visibility(), "final class Main {}");
    }

    #[test]
    fn test_without_visibility_keeps_annotations() {
        let d = decl("@Deprecated\npublic class Main {}", Some(12..19));
        assert_eq!(d.without_visibility(), "@Deprecated\nclass Main {}");
    }

    #[test]
    fn test_without_visibility_borrows_when_not_public() {
        let d = decl("class Main {}", None);
        assert!(matches!(d.without_visibility(), Cow::Borrowed(_)));
        assert!(!d.is_public());
    }

    #[test]
    fn test_import_display() {
        assert_eq!(Import::plain("java.util.List").to_string(), "import java.util.List;");
        let wildcard = Import {
            path: "java.util".into(),
            is_static: false,
            is_wildcard: true,
        };
        assert_eq!(wildcard.to_string(), "import java.util.*;");
        let static_import = Import {
            path: "java.lang.Math.max".into(),
            is_static: true,
            is_wildcard: false,
        };
        assert_eq!(static_import.to_string(), "import static java.lang.Math.max;");
        assert_ne!(static_import, Import::plain("java.lang.Math.max"));
    }
}
