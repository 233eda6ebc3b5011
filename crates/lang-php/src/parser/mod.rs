//! tree-sitter front end for PHP sources.

pub mod ast;
pub mod index;
pub mod kinds;

pub use ast::{children, doc_comment_before, named_children, node_text, range_of};
pub use index::SymbolReader;
pub use kinds::ExprKind;

use phpscope_core::document::TextDocument;
use phpscope_core::error::{PhpscopeError, Result};
use tree_sitter::{Node, Parser, Tree};

#[derive(Clone)]
pub struct PhpParser {
    pub language: tree_sitter::Language,
}

impl PhpParser {
    pub fn new() -> Result<Self> {
        let language: tree_sitter::Language = tree_sitter_php::LANGUAGE_PHP.into();
        // Fail early on an ABI mismatch instead of on first parse.
        Parser::new()
            .set_language(&language)
            .map_err(|e| PhpscopeError::Parsing(e.to_string()))?;
        Ok(Self { language })
    }

    pub fn parse(&self, uri: &str, text: &str) -> Result<ParsedDocument> {
        self.parse_document(TextDocument::new(uri, text))
    }

    pub fn parse_document(&self, document: TextDocument) -> Result<ParsedDocument> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| PhpscopeError::Parsing(e.to_string()))?;
        let tree = parser
            .parse(document.text(), None)
            .ok_or_else(|| PhpscopeError::Parsing(format!("no tree produced for {}", document.uri())))?;
        Ok(ParsedDocument { document, tree })
    }
}

/// An immutable document snapshot together with its syntax tree.
pub struct ParsedDocument {
    document: TextDocument,
    tree: Tree,
}

impl ParsedDocument {
    pub fn document(&self) -> &TextDocument {
        &self.document
    }

    pub fn uri(&self) -> &str {
        self.document.uri()
    }

    pub fn text(&self) -> &str {
        self.document.text()
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn node_text(&self, node: &Node) -> &str {
        node_text(node, self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_php_source() {
        let parser = PhpParser::new().unwrap();
        let doc = parser
            .parse("file:///a.php", "<?php\nclass A { public function f() {} }\n")
            .unwrap();
        let root = doc.root_node();
        assert_eq!(root.kind(), "program");
        assert!(!root.has_error());
        let class = named_children(root)
            .into_iter()
            .find(|n| n.kind() == "class_declaration")
            .unwrap();
        assert_eq!(doc.node_text(&class.child_by_field_name("name").unwrap()), "A");
    }
}
