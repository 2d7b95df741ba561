//! Top-level definition extraction backed by tree-sitter.

use std::collections::BTreeMap;

use tracing::warn;
use tree_sitter::{Node, Parser};

use controlkb_shared::{ControlKbError, Result};

/// Extracts the source text of named top-level definitions from Python code.
pub struct SymbolExtractor {
    parser: Parser,
}

impl SymbolExtractor {
    /// Create an extractor with the Python grammar loaded.
    pub fn new() -> Result<Self> {
        let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| ControlKbError::parse(format!("failed to load Python grammar: {e}")))?;
        Ok(Self { parser })
    }

    /// Map each name in `wanted` that is defined at module level to its source.
    ///
    /// Classes, functions (decorated or not) and single-target assignments
    /// are considered. Names without a definition are left out. When a name
    /// is bound twice, the later binding wins.
    pub fn extract(&mut self, source: &str, wanted: &[String]) -> BTreeMap<String, String> {
        let mut found = BTreeMap::new();
        if wanted.is_empty() {
            return found;
        }

        let Some(tree) = self.parser.parse(source, None) else {
            warn!("parser returned no tree, skipping symbol extraction");
            return found;
        };

        let lines: Vec<&str> = source.lines().collect();
        let root = tree.root_node();
        let mut cursor = root.walk();

        for child in root.children(&mut cursor) {
            let Some((name, node)) = top_level_definition(child, source) else {
                continue;
            };
            if wanted.iter().any(|w| w == name) {
                found.insert(name.to_string(), capture_span(&lines, node));
            }
        }

        found
    }
}

/// Name and defining node of a module-level statement, if it binds one name.
fn top_level_definition<'t, 's>(node: Node<'t>, source: &'s str) -> Option<(&'s str, Node<'t>)> {
    match node.kind() {
        "class_definition" | "function_definition" => {
            let name = node.child_by_field_name("name")?;
            Some((name.utf8_text(source.as_bytes()).ok()?, node))
        }
        "decorated_definition" => {
            top_level_definition(node.child_by_field_name("definition")?, source)
        }
        "expression_statement" => {
            if node.named_child_count() != 1 {
                return None;
            }
            let assignment = node.named_child(0)?;
            if assignment.kind() != "assignment" || assignment.child_by_field_name("type").is_some()
            {
                return None;
            }
            let left = assignment.child_by_field_name("left")?;
            if left.kind() != "identifier" {
                return None;
            }
            // a = b = value binds two names
            if assignment
                .child_by_field_name("right")
                .is_some_and(|right| right.kind() == "assignment")
            {
                return None;
            }
            Some((left.utf8_text(source.as_bytes()).ok()?, assignment))
        }
        _ => None,
    }
}

/// Full lines covered by `node`.
fn capture_span(lines: &[&str], node: Node<'_>) -> String {
    let start = node.start_position().row;
    let end = if node.has_error() {
        indented_block_end(lines, start)
    } else {
        last_row(node)
    };
    let end = end.min(lines.len().saturating_sub(1));
    lines
        .get(start..=end)
        .map(|span| span.join("\n"))
        .unwrap_or_default()
}

fn last_row(node: Node<'_>) -> usize {
    let end = node.end_position();
    if end.column == 0 && end.row > node.start_position().row {
        end.row - 1
    } else {
        end.row
    }
}

/// Last row of a statement starting at `start`, following indented continuation lines.
fn indented_block_end(lines: &[&str], start: usize) -> usize {
    let mut end = start;
    while lines
        .get(end + 1)
        .is_some_and(|line| line.starts_with([' ', '\t']))
    {
        end += 1;
    }
    end
}
