//! Small node helpers shared by the reader and the inference code.

use phpscope_api::models::symbol::Range;
use tree_sitter::Node;

/// Source text of `node`; empty when the range is not valid UTF-8.
pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

pub fn range_of(node: &Node) -> Range {
    let start = node.start_position();
    let end = node.end_position();
    Range {
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
        start_line: start.row,
        start_col: start.column,
        end_line: end.row,
        end_col: end.column,
    }
}

pub fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Named children without comments.
pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// The `/** ... */` comment directly preceding a declaration.
pub fn doc_comment_before<'a>(node: &Node, source: &'a str) -> Option<&'a str> {
    let mut prev = node.prev_sibling();
    while let Some(sibling) = prev {
        if sibling.kind() == "attribute_list" {
            prev = sibling.prev_sibling();
            continue;
        }
        if sibling.kind() != "comment" {
            return None;
        }
        let text = node_text(&sibling, source);
        return text.starts_with("/**").then_some(text);
    }
    None
}

pub fn is_name(node: &Node) -> bool {
    matches!(node.kind(), "name" | "qualified_name" | "relative_name")
}
