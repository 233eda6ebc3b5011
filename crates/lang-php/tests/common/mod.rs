use lsp_types::Position;
use phpscope_core::config::AnalysisConfig;
use phpscope_lang::parser::ParsedDocument;
use phpscope_lang::{Context, Workspace};
use std::sync::Arc;
use tree_sitter::Node;

/// Cursor marker inside test sources.
pub const CURSOR: &str = "<|>";

/// A workspace with `files` indexed through the real grammar.
#[allow(dead_code)]
pub fn setup_php_workspace(files: &[(&str, &str)]) -> Workspace {
    setup_php_workspace_with(files, AnalysisConfig::default())
}

#[allow(dead_code)]
pub fn setup_php_workspace_with(files: &[(&str, &str)], config: AnalysisConfig) -> Workspace {
    let workspace = Workspace::new(config).expect("workspace");
    let documents = files
        .iter()
        .map(|(uri, text)| (uri.to_string(), text.to_string()))
        .collect();
    workspace.index_all(documents).expect("index");
    workspace
}

/// Opens `marked` (which contains one [`CURSOR`]) and returns the snapshot
/// and the cursor position.
#[allow(dead_code)]
pub fn open_at_cursor(workspace: &Workspace, uri: &str, marked: &str) -> (Arc<ParsedDocument>, Position) {
    let offset = marked.find(CURSOR).expect("cursor marker");
    let text = marked.replacen(CURSOR, "", 1);
    let document = workspace.open(uri, &text).expect("open");
    let position = document.document().position_at(offset);
    (document, position)
}

/// Type of a variable at the cursor, as text.
#[allow(dead_code)]
pub fn variable_type_at(workspace: &Workspace, marked: &str, variable: &str) -> String {
    let (document, position) = open_at_cursor(workspace, "file:///test.php", marked);
    let context = workspace.context(&document, position);
    context.variable_table().get(variable).to_string()
}

/// The receiver of the `->` or `::` right before the cursor.
#[allow(dead_code)]
pub fn receiver_before_operator<'a>(context: &Context<'a>) -> Option<Node<'a>> {
    let before = context.text_before(context.offset());
    let trimmed = before.trim_end_matches(|c: char| c.is_alphanumeric() || c == '_');
    let operator_len = ["?->", "->", "::"]
        .iter()
        .find(|op| trimmed.ends_with(*op))?
        .len();
    let end = trimmed.len() - operator_len;
    if end == 0 {
        return None;
    }
    let root = context.document().root_node();
    let mut node = root.named_descendant_for_byte_range(end - 1, end - 1)?;
    while let Some(parent) = node.parent() {
        if parent.end_byte() != node.end_byte()
            || matches!(parent.kind(), "ERROR" | "expression_statement" | "program")
        {
            break;
        }
        node = parent;
    }
    Some(node)
}
