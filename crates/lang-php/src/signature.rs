//! Call-site lookup for signature help.

use crate::context::Context;
use crate::inference::members::find_method;
use crate::naming::ImportKind;
use crate::parser::ast::{children, named_children};
use phpscope_api::models::symbol::PhpSymbol;
use phpscope_api::models::types::TypeString;
use std::sync::Arc;
use tree_sitter::Node;

const CALL_KINDS: &[&str] = &[
    "function_call_expression",
    "member_call_expression",
    "nullsafe_member_call_expression",
    "scoped_call_expression",
    "object_creation_expression",
];

/// The callable whose argument list holds the cursor.
#[derive(Debug, Clone)]
pub struct SignatureSite {
    pub symbol: Arc<PhpSymbol>,
    /// Zero-based index of the argument under the cursor.
    pub argument_index: usize,
}

pub fn signature_site(context: &Context) -> Option<SignatureSite> {
    let offset = context.offset();
    let arguments = context.spine().iter().rev().copied().find(|node| {
        node.kind() == "arguments"
            && node.parent().is_some_and(|p| CALL_KINDS.contains(&p.kind()))
            && !is_closed_before(node, offset)
    })?;
    let call = arguments.parent()?;
    let symbol = resolve_callable(context, call)?;
    let argument_index = children(arguments)
        .into_iter()
        .filter(|child| child.kind() == "," && child.end_byte() <= offset)
        .count();
    Some(SignatureSite {
        symbol,
        argument_index,
    })
}

/// Whether the cursor sits after the closing parenthesis.
fn is_closed_before(arguments: &Node, offset: usize) -> bool {
    children(*arguments)
        .last()
        .is_some_and(|last| last.kind() == ")" && !last.is_missing() && last.end_byte() <= offset)
}

fn resolve_callable(context: &Context, call: Node) -> Option<Arc<PhpSymbol>> {
    let ctx = context.infer_context();
    match call.kind() {
        "function_call_expression" => {
            let function = call.child_by_field_name("function")?;
            let name = context.node_text(&function);
            ctx.names
                .resolve_candidates(name, ImportKind::Function)
                .iter()
                .find_map(|fqn| ctx.store.find_function(fqn))
        }
        "member_call_expression" | "nullsafe_member_call_expression" => {
            let receiver = context.resolve_expression_type(&call.child_by_field_name("object")?);
            let name = context.node_text(&call.child_by_field_name("name")?);
            find_method(&ctx, &receiver, name)
        }
        "scoped_call_expression" => {
            let scope = call.child_by_field_name("scope")?;
            let receiver = match scope.kind() {
                "relative_scope" | "name" | "qualified_name" | "relative_name" => {
                    TypeString::atom(&ctx.class_reference(context.node_text(&scope))?)
                }
                _ => context.resolve_expression_type(&scope),
            };
            let name = context.node_text(&call.child_by_field_name("name")?);
            find_method(&ctx, &receiver, name)
        }
        "object_creation_expression" => {
            let class = named_children(call).into_iter().next()?;
            if !matches!(class.kind(), "name" | "qualified_name" | "relative_name") {
                return None;
            }
            let fqn = ctx.class_reference(context.node_text(&class))?;
            find_method(&ctx, &TypeString::atom(&fqn), "__construct")
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{PhpParser, SymbolReader};
    use phpscope_core::config::AnalysisConfig;
    use phpscope_core::store::MemorySymbolStore;

    fn site_at(marked: &str) -> Option<(String, usize)> {
        let offset = marked.find("<|>").unwrap();
        let source = marked.replacen("<|>", "", 1);
        let doc = PhpParser::new().unwrap().parse("file:///t.php", &source).unwrap();
        let store = MemorySymbolStore::new();
        store.add_document(doc.uri(), SymbolReader::read_document(&doc));
        let context = Context::at_offset(&doc, &store, offset, AnalysisConfig::default());
        signature_site(&context).map(|site| (site.symbol.name.clone(), site.argument_index))
    }

    #[test]
    fn function_argument_index() {
        let source = "<?php\nfunction add(int $a, int $b) {}\nadd(1, <|>2);\n";
        assert_eq!(site_at(source), Some(("add".to_string(), 1)));
    }

    #[test]
    fn nested_call_uses_innermost_arguments() {
        let source = "<?php\nfunction outer($x, $y) {}\nfunction inner($z) {}\nouter(1, inner(<|>));\n";
        assert_eq!(site_at(source), Some(("inner".to_string(), 0)));
    }

    #[test]
    fn constructor_and_methods() {
        let source = "<?php\nclass Point {\n    public function __construct(int $x, int $y) {}\n    public function move(int $dx) {}\n}\n$p = new Point(1, <|>);\n";
        assert_eq!(site_at(source), Some(("__construct".to_string(), 1)));
        let source = "<?php\nclass Point {\n    public function move(int $dx) {}\n}\n$p = new Point();\n$p->move(<|>);\n";
        assert_eq!(site_at(source), Some(("move".to_string(), 0)));
    }

    #[test]
    fn outside_of_arguments() {
        let source = "<?php\nfunction add($a) {}\nadd(1)<|>;\n";
        assert_eq!(site_at(source), None);
    }
}
