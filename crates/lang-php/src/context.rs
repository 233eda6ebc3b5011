//! Per-request resolution context.
//!
//! A [`Context`] is built for one cursor position in one document snapshot.
//! It finds the chain of syntax nodes spanning the cursor (the spine) and
//! exposes lazily computed facts about that position: namespace, enclosing
//! class and function, the variables in scope and expression types. Every
//! fact is computed at most once.

use crate::inference::{
    ClassContext, ExpressionTypeResolver, InferContext, VariableTable, VariableTableBuilder,
};
use crate::naming::{ImportKind, NameResolver};
use crate::parser::ParsedDocument;
use crate::parser::ast::{children, is_name, named_children, node_text};
use crate::parser::index::{SymbolReader, read_modifiers};
use lsp_types::Position;
use once_cell::unsync::OnceCell;
use phpscope_api::models::symbol::{PhpSymbol, SymbolKind};
use phpscope_api::models::types::TypeString;
use phpscope_api::store::SymbolStore;
use phpscope_core::config::AnalysisConfig;
use std::sync::Arc;
use tree_sitter::Node;

const CLASS_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "trait_declaration",
    "enum_declaration",
];

const FUNCTION_KINDS: &[&str] = &[
    "function_definition",
    "method_declaration",
    "anonymous_function",
    "arrow_function",
];

pub struct Context<'a> {
    document: &'a ParsedDocument,
    store: &'a dyn SymbolStore,
    config: AnalysisConfig,
    position: Position,
    offset: usize,
    spine: Vec<Node<'a>>,
    names: OnceCell<NameResolver>,
    document_symbols: OnceCell<Vec<Arc<PhpSymbol>>>,
    class_name: OnceCell<Option<String>>,
    class_base_name: OnceCell<Option<String>>,
    class_symbol: OnceCell<Option<Arc<PhpSymbol>>>,
    class_base_symbol: OnceCell<Option<Arc<PhpSymbol>>>,
    scope_symbol: OnceCell<Option<Arc<PhpSymbol>>>,
    variables: OnceCell<VariableTable>,
}

impl<'a> Context<'a> {
    pub fn new(document: &'a ParsedDocument, store: &'a dyn SymbolStore, position: Position) -> Self {
        Self::with_config(document, store, position, AnalysisConfig::default())
    }

    pub fn with_config(
        document: &'a ParsedDocument,
        store: &'a dyn SymbolStore,
        position: Position,
        config: AnalysisConfig,
    ) -> Self {
        let offset = document.document().offset_at(position);
        Self::build(document, store, position, offset, config)
    }

    /// A context at a byte offset instead of a line/column position.
    pub fn at_offset(
        document: &'a ParsedDocument,
        store: &'a dyn SymbolStore,
        offset: usize,
        config: AnalysisConfig,
    ) -> Self {
        let position = document.document().position_at(offset);
        let offset = document.document().offset_at(position);
        Self::build(document, store, position, offset, config)
    }

    fn build(
        document: &'a ParsedDocument,
        store: &'a dyn SymbolStore,
        position: Position,
        offset: usize,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            document,
            store,
            config,
            position,
            offset,
            spine: build_spine(document.root_node(), offset),
            names: OnceCell::new(),
            document_symbols: OnceCell::new(),
            class_name: OnceCell::new(),
            class_base_name: OnceCell::new(),
            class_symbol: OnceCell::new(),
            class_base_symbol: OnceCell::new(),
            scope_symbol: OnceCell::new(),
            variables: OnceCell::new(),
        }
    }

    pub fn document(&self) -> &'a ParsedDocument {
        self.document
    }

    pub fn store(&self) -> &'a dyn SymbolStore {
        self.store
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Nodes spanning the cursor, outermost (the program) first.
    pub fn spine(&self) -> &[Node<'a>] {
        &self.spine
    }

    /// The innermost node spanning the cursor.
    pub fn token(&self) -> Option<Node<'a>> {
        self.spine.last().copied()
    }

    pub fn text_before(&self, len: usize) -> &'a str {
        self.document.document().text_before(self.offset, len)
    }

    pub fn node_text(&self, node: &Node) -> &'a str {
        node_text(node, self.document.text())
    }

    pub fn name_resolver(&self) -> &NameResolver {
        self.names.get_or_init(|| {
            NameResolver::at_offset(self.document.root_node(), self.document.text(), self.offset)
        })
    }

    pub fn namespace(&self) -> &str {
        self.name_resolver().namespace()
    }

    /// The namespace declaration in effect: the braced one enclosing the
    /// cursor, else the last unbraced one before it.
    pub fn namespace_definition(&self) -> Option<Node<'a>> {
        if let Some(braced) = self.innermost(&["namespace_definition"]) {
            return Some(braced);
        }
        let mut current = None;
        for statement in named_children(self.document.root_node()) {
            if statement.start_byte() >= self.offset {
                break;
            }
            if statement.kind() == "namespace_definition" {
                current = statement
                    .child_by_field_name("body")
                    .is_none()
                    .then_some(statement);
            }
        }
        current
    }

    /// The last `use` declaration of the namespace holding the cursor. New
    /// imports go after it.
    pub fn last_namespace_use_declaration(&self) -> Option<Node<'a>> {
        let namespace = self.namespace_definition();
        let statements = match namespace.and_then(|ns| ns.child_by_field_name("body")) {
            Some(body) => named_children(body),
            None => {
                let start = namespace.map(|ns| ns.end_byte()).unwrap_or(0);
                named_children(self.document.root_node())
                    .into_iter()
                    .skip_while(|statement| statement.start_byte() < start)
                    .take_while(|statement| statement.kind() != "namespace_definition")
                    .collect()
            }
        };
        statements
            .into_iter()
            .filter(|statement| statement.kind() == "namespace_use_declaration")
            .last()
    }

    /// The `<?php` tag that opens the code section holding the cursor.
    pub fn opening_inline_text(&self) -> Option<Node<'a>> {
        named_children(self.document.root_node())
            .into_iter()
            .take_while(|node| node.start_byte() < self.offset)
            .filter(|node| node.kind() == "php_tag")
            .last()
    }

    /// Identifier-like text ending at the cursor, `$` and `\` included.
    pub fn word(&self) -> &'a str {
        let text = self.document.text();
        let end = self.offset.min(text.len());
        let start = text[..end]
            .char_indices()
            .rev()
            .take_while(|(_, c)| is_word_char(*c))
            .last()
            .map(|(i, _)| i)
            .unwrap_or(end);
        &text[start..end]
    }

    pub fn word_start_position(&self) -> Position {
        let start = self.offset - self.word().len();
        self.document.document().position_at(start)
    }

    fn innermost(&self, kinds: &[&str]) -> Option<Node<'a>> {
        self.spine
            .iter()
            .rev()
            .find(|node| kinds.contains(&node.kind()))
            .copied()
    }

    pub fn class_node(&self) -> Option<Node<'a>> {
        self.innermost(CLASS_KINDS)
    }

    /// Fully-qualified name of the enclosing class-like declaration.
    pub fn class_name(&self) -> Option<&str> {
        self.class_name
            .get_or_init(|| {
                let node = self.class_node()?;
                let name = self.node_text(&node.child_by_field_name("name")?);
                let namespace = self.namespace();
                Some(if namespace.is_empty() {
                    name.to_string()
                } else {
                    format!("{namespace}\\{name}")
                })
            })
            .as_deref()
    }

    /// The first type listed in the enclosing declaration's `extends` clause.
    pub fn class_base_name(&self) -> Option<&str> {
        self.class_base_name
            .get_or_init(|| {
                let node = self.class_node()?;
                let clause = named_children(node)
                    .into_iter()
                    .find(|child| child.kind() == "base_clause")?;
                let base = named_children(clause).into_iter().find(is_name)?;
                Some(self.name_resolver().resolve_class(self.node_text(&base)))
            })
            .as_deref()
    }

    /// The enclosing class-like record: the store's record for this document
    /// first, then the one read from the document itself, then any record
    /// with that name.
    pub fn class_symbol(&self) -> Option<&Arc<PhpSymbol>> {
        self.class_symbol
            .get_or_init(|| {
                let name = self.class_name()?;
                let indexed = self.store.find_symbols(name);
                indexed
                    .iter()
                    .find(|s| s.is_class_like() && s.uri == self.document.uri())
                    .cloned()
                    .or_else(|| {
                        find_symbol(self.document_symbols(), &|s| {
                            s.is_class_like() && s.name.eq_ignore_ascii_case(name)
                        })
                    })
                    .or_else(|| indexed.into_iter().find(|s| s.is_class_like()))
            })
            .as_ref()
    }

    pub fn class_base_symbol(&self) -> Option<&Arc<PhpSymbol>> {
        self.class_base_symbol
            .get_or_init(|| self.store.find_class(self.class_base_name()?))
            .as_ref()
    }

    /// The innermost function, method, closure or arrow function.
    pub fn scope_node(&self) -> Option<Node<'a>> {
        self.innermost(FUNCTION_KINDS)
    }

    /// The record of [`Context::scope_node`]. Closures absent from the
    /// document records are read on the spot.
    pub fn scope_symbol(&self) -> Option<&Arc<PhpSymbol>> {
        self.scope_symbol
            .get_or_init(|| self.callable_symbol(self.scope_node()?))
            .as_ref()
    }

    fn callable_symbol(&self, node: Node) -> Option<Arc<PhpSymbol>> {
        let start = node.start_byte();
        find_symbol(self.document_symbols(), &|s| {
            matches!(s.kind, SymbolKind::Function | SymbolKind::Method)
                && s.range.start_byte == start
        })
        .or_else(|| {
            let reader = SymbolReader::with_names(
                self.document.text(),
                self.document.uri(),
                self.name_resolver().clone(),
            );
            Some(Arc::new(reader.read_callable(node)))
        })
    }

    /// Declarations read from this document snapshot.
    pub fn document_symbols(&self) -> &[Arc<PhpSymbol>] {
        self.document_symbols
            .get_or_init(|| SymbolReader::read_document(self.document))
    }

    pub fn class_context(&self) -> ClassContext {
        ClassContext {
            self_class: self.class_name().map(str::to_string),
            parent_class: self.class_base_name().map(str::to_string),
        }
    }

    pub fn infer_context(&self) -> InferContext<'_> {
        InferContext::new(
            self.document.text(),
            self.store,
            self.name_resolver(),
            &self.config,
        )
        .with_class(self.class_context())
    }

    /// Variables in scope at the cursor.
    pub fn variable_table(&self) -> &VariableTable {
        self.variables.get_or_init(|| {
            let ctx = self.infer_context();
            let mut builder = VariableTableBuilder::new(&ctx, self.offset);
            let scope = self
                .spine
                .iter()
                .rev()
                .find(|node| matches!(node.kind(), "function_definition" | "method_declaration"))
                .copied();
            let Some(scope) = scope else {
                return builder.build(self.document.root_node());
            };
            if scope.kind() == "method_declaration"
                && !read_modifiers(scope, self.document.text()).is_static
            {
                if let Some(class) = self.class_name() {
                    builder.seed("$this", TypeString::atom(class));
                }
            }
            if let Some(symbol) = self.callable_symbol(scope) {
                builder.seed_parameters(&symbol);
            }
            builder.build(scope)
        })
    }

    pub fn resolve_expression_type(&self, node: &Node) -> TypeString {
        let ctx = self.infer_context();
        ExpressionTypeResolver::new(&ctx, self.variable_table()).resolve(node)
    }

    /// Fully-qualified name of `name` used as a `kind`. Functions and
    /// constants try each candidate against the store and fall back to the
    /// first one.
    pub fn resolve_fqn(&self, name: &str, kind: SymbolKind) -> String {
        let names = self.name_resolver();
        let import_kind = match kind {
            SymbolKind::Function => ImportKind::Function,
            SymbolKind::Constant => ImportKind::Constant,
            _ => return names.resolve_class(name),
        };
        let candidates = names.resolve_candidates(name, import_kind);
        candidates
            .iter()
            .find(|fqn| {
                self.store
                    .find_symbols(fqn)
                    .iter()
                    .any(|symbol| symbol.kind == kind)
            })
            .or_else(|| candidates.first())
            .cloned()
            .unwrap_or_default()
    }

    /// Resolves a name node, taking its kind from where it appears.
    pub fn resolve_fqn_node(&self, node: &Node) -> String {
        self.resolve_fqn(self.node_text(node), name_usage(node))
    }
}

fn build_spine(root: Node, offset: usize) -> Vec<Node> {
    let mut spine = vec![root];
    let mut current = root;
    while let Some(child) = children(current)
        .into_iter()
        .find(|child| child.start_byte() < offset && offset <= child.end_byte())
    {
        spine.push(child);
        current = child;
    }
    spine
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '\\') || !c.is_ascii()
}

fn find_symbol(
    symbols: &[Arc<PhpSymbol>],
    predicate: &dyn Fn(&PhpSymbol) -> bool,
) -> Option<Arc<PhpSymbol>> {
    for symbol in symbols {
        if predicate(symbol) {
            return Some(symbol.clone());
        }
        if let Some(found) = find_symbol(&symbol.children, predicate) {
            return Some(found);
        }
    }
    None
}

fn name_usage(node: &Node) -> SymbolKind {
    let Some(parent) = node.parent() else {
        return SymbolKind::Class;
    };
    match parent.kind() {
        "function_call_expression"
            if parent
                .child_by_field_name("function")
                .is_some_and(|f| f.id() == node.id()) =>
        {
            SymbolKind::Function
        }
        "expression_statement" | "argument" | "binary_expression" | "assignment_expression"
        | "return_statement" | "array_element_initializer" | "parenthesized_expression"
        | "conditional_expression" => SymbolKind::Constant,
        _ => SymbolKind::Class,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PhpParser;
    use phpscope_core::store::MemorySymbolStore;

    fn parse(source: &str) -> (ParsedDocument, MemorySymbolStore) {
        let doc = PhpParser::new().unwrap().parse("file:///t.php", source).unwrap();
        let store = MemorySymbolStore::new();
        store.add_document(doc.uri(), SymbolReader::read_document(&doc));
        (doc, store)
    }

    #[test]
    fn word_stops_at_non_identifier() {
        let source = "<?php\n$x = \\App\\Mo";
        let (doc, store) = parse(source);
        let ctx = Context::at_offset(&doc, &store, source.len(), AnalysisConfig::default());
        assert_eq!(ctx.word(), "\\App\\Mo");
        assert_eq!(ctx.word_start_position(), Position::new(1, 5));
    }

    #[test]
    fn class_facts_at_cursor() {
        let source = "<?php\nnamespace App;\nclass Child extends Base {\n    public function run(int $n) {\n        $n;\n    }\n}\n";
        let (doc, store) = parse(source);
        let offset = source.find("$n;").unwrap() + 2;
        let ctx = Context::at_offset(&doc, &store, offset, AnalysisConfig::default());
        assert_eq!(ctx.namespace(), "App");
        assert_eq!(ctx.class_name(), Some("App\\Child"));
        assert_eq!(ctx.class_base_name(), Some("App\\Base"));
        assert_eq!(ctx.class_symbol().unwrap().name, "App\\Child");
        assert!(ctx.class_base_symbol().is_none());
        assert_eq!(ctx.scope_symbol().unwrap().name, "run");
        assert_eq!(ctx.variable_table().get("$this").to_string(), "App\\Child");
        assert_eq!(ctx.variable_table().get("$n").to_string(), "int");
        assert_eq!(ctx.token().unwrap().kind(), "name");
    }

    #[test]
    fn resolve_fqn_prefers_existing_candidates() {
        let source = "<?php\nnamespace App;\nfunction helper() {}\n$x = 1;\n";
        let (doc, store) = parse(source);
        let ctx = Context::at_offset(&doc, &store, source.len(), AnalysisConfig::default());
        assert_eq!(ctx.resolve_fqn("helper", SymbolKind::Function), "App\\helper");
        assert_eq!(ctx.resolve_fqn("strlen", SymbolKind::Function), "App\\strlen");
        assert_eq!(ctx.resolve_fqn("Foo", SymbolKind::Class), "App\\Foo");
    }

    #[test]
    fn namespace_and_import_anchors() {
        let source = "<?php\nnamespace App;\n\nuse Lib\\A;\nuse Lib\\B;\n\nclass C {}\n$x = 1;\n";
        let (doc, store) = parse(source);
        let ctx = Context::at_offset(&doc, &store, source.find("$x").unwrap(), AnalysisConfig::default());
        let namespace = ctx.namespace_definition().unwrap();
        assert_eq!(ctx.node_text(&namespace), "namespace App;");
        let last_use = ctx.last_namespace_use_declaration().unwrap();
        assert_eq!(ctx.node_text(&last_use), "use Lib\\B;");
        assert_eq!(ctx.opening_inline_text().unwrap().kind(), "php_tag");
        assert!(ctx.document_symbols().iter().any(|s| s.name == "App"));
    }

    #[test]
    fn braced_namespaces_scope_their_imports() {
        let source = "<?php\nnamespace A { use X\\One; }\nnamespace B {\n    use Y\\Two;\n    $y = 1;\n}\n";
        let (doc, store) = parse(source);
        let ctx = Context::at_offset(&doc, &store, source.find("$y").unwrap(), AnalysisConfig::default());
        let namespace = ctx.namespace_definition().unwrap();
        assert_eq!(ctx.node_text(&namespace.child_by_field_name("name").unwrap()), "B");
        let last_use = ctx.last_namespace_use_declaration().unwrap();
        assert_eq!(ctx.node_text(&last_use), "use Y\\Two;");

        let global = "<?php\n$z = 1;\n";
        let (doc, store) = parse(global);
        let ctx = Context::at_offset(&doc, &store, global.len(), AnalysisConfig::default());
        assert!(ctx.namespace_definition().is_none());
        assert!(ctx.last_namespace_use_declaration().is_none());
    }
}
