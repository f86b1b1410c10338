//! Java language parser implementation.
//!
//! Handles .java files. Extracts the package declaration, imports, the
//! top-level type declarations with their source text, and detects the
//! `public static void main` entry point.

use crate::languages::LanguageParser;
use crate::node::{Import, ParsedUnit, TypeDecl, TypeKind};
use tree_sitter::{Language, Node, Tree};

pub struct JavaParser;

impl LanguageParser for JavaParser {
    fn language(&self) -> Language {
        tree_sitter_java::language()
    }

    fn extensions(&self) -> &[&str] {
        &["java"]
    }

    fn extract_unit(&self, tree: &Tree, source: &str) -> ParsedUnit {
        let root = tree.root_node();
        let mut unit = ParsedUnit::default();

        for i in 0..root.child_count() {
            let Some(child) = root.child(i) else {
                continue;
            };

            match child.kind() {
                "package_declaration" => {
                    unit.namespace = extract_dotted_name(&child, source);
                }
                "import_declaration" => {
                    if let Some(import) = extract_import(&child, source) {
                        unit.imports.push(import);
                    }
                }
                kind => {
                    if let Some(type_kind) = TypeKind::from_node_kind(kind) {
                        if let Some(decl) = extract_type(&child, source, type_kind) {
                            unit.types.push(decl);
                        }
                    }
                }
            }
        }

        unit.has_entry = contains_entry_point(&root, source);
        unit
    }
}

/// Reads the `identifier` / `scoped_identifier` child of a package or import.
fn extract_dotted_name(node: &Node, source: &str) -> Option<String> {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if matches!(child.kind(), "identifier" | "scoped_identifier") {
                // `java . util . List` is legal, so drop any inner whitespace.
                let name: String = get_text(&child, source).split_whitespace().collect();
                return Some(name);
            }
        }
    }
    None
}

/// Extracts `import [static] a.b.C[.*];`.
fn extract_import(node: &Node, source: &str) -> Option<Import> {
    let path = extract_dotted_name(node, source)?;
    Some(Import {
        path,
        is_static: find_child_by_kind(node, "static").is_some(),
        is_wildcard: find_child_by_kind(node, "asterisk").is_some(),
    })
}

/// Extracts a top-level class, interface, enum, record or annotation type.
fn extract_type(node: &Node, source: &str, kind: TypeKind) -> Option<TypeDecl> {
    let name_node = node.child_by_field_name("name")?;
    let start = node.start_byte();
    let end = node.end_byte();

    let visibility = find_child_by_kind(node, "modifiers")
        .and_then(|modifiers| find_child_by_kind(&modifiers, "public"))
        .map(|public| {
            let rest = &source[public.end_byte()..end];
            let whitespace = rest.len() - rest.trim_start().len();
            (public.start_byte() - start)..(public.end_byte() + whitespace - start)
        });

    Some(TypeDecl {
        name: get_text(&name_node, source),
        kind,
        text: source[start..end].to_string(),
        visibility,
    })
}

/// Looks anywhere in the tree for a `public static` method named `main`.
fn contains_entry_point(node: &Node, source: &str) -> bool {
    if node.kind() == "method_declaration" && is_entry_method(node, source) {
        return true;
    }

    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if contains_entry_point(&child, source) {
                return true;
            }
        }
    }
    false
}

fn is_entry_method(node: &Node, source: &str) -> bool {
    let named_main = node
        .child_by_field_name("name")
        .map(|name| get_text(&name, source) == "main")
        .unwrap_or(false);

    named_main
        && find_child_by_kind(node, "modifiers")
            .map(|m| has_modifier(&m, "public") && has_modifier(&m, "static"))
            .unwrap_or(false)
}

/// Gets the text content of a node.
fn get_text(node: &Node, source: &str) -> String {
    source[node.byte_range()].to_string()
}

/// Finds a child node by its kind.
fn find_child_by_kind<'a>(node: &Node<'a>, kind: &str) -> Option<Node<'a>> {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if child.kind() == kind {
                return Some(child);
            }
        }
    }
    None
}

/// Checks a `modifiers` node for a keyword.
fn has_modifier(modifiers: &Node, keyword: &str) -> bool {
    find_child_by_kind(modifiers, keyword).is_some()
}
