//! Variable table builder.
//!
//! Replays the statements of a function body (or of the top-level program)
//! up to the cursor. Completed statements are applied with branch merging;
//! the statement containing the cursor is only descended into along the path
//! to the cursor, so sibling branches and later code never leak in.

use super::table::VariableTable;
use crate::inference::context::InferContext;
use crate::inference::expr::ExpressionTypeResolver;
use crate::parser::ast::{named_children, node_text};
use crate::parser::index::SymbolReader;
use crate::phpdoc;
use phpscope_api::models::symbol::PhpSymbol;
use phpscope_api::models::types::TypeString;
use tree_sitter::Node;

/// Builds the [`VariableTable`] in effect at `offset`.
pub struct VariableTableBuilder<'a, 'b> {
    ctx: &'a InferContext<'b>,
    offset: usize,
    table: VariableTable,
    /// `@var` types waiting for the next assignment; unnamed ones have an
    /// empty name.
    pending: Vec<(String, TypeString)>,
}

impl<'a, 'b> VariableTableBuilder<'a, 'b> {
    pub fn new(ctx: &'a InferContext<'b>, offset: usize) -> Self {
        Self {
            ctx,
            offset,
            table: VariableTable::new(),
            pending: Vec::new(),
        }
    }

    pub fn seed(&mut self, name: impl Into<String>, ty: TypeString) {
        self.table.set(name, ty);
    }

    /// Binds each parameter of `callable` to its declared type.
    pub fn seed_parameters(&mut self, callable: &PhpSymbol) {
        for param in callable.parameters() {
            let ty = self.bind_self(&param.type_string);
            self.table.set(param.name.clone(), ty);
        }
    }

    /// Binds `self`, `static` and `$this` to the enclosing class.
    fn bind_self(&self, ty: &TypeString) -> TypeString {
        match self.ctx.class.self_class.as_deref() {
            Some(class) => ty.resolve_self(class, class),
            None => ty.clone(),
        }
    }

    /// Replays `scope`, a function-like node or the program root.
    pub fn build(mut self, scope: Node) -> VariableTable {
        if scope.kind() == "program" {
            self.walk_statements(scope);
        } else if let Some(body) = scope.child_by_field_name("body") {
            self.walk_statements(body);
        }
        self.table
    }

    fn walk_statements(&mut self, container: Node) {
        let mut cursor = container.walk();
        let statements: Vec<Node> = container.named_children(&mut cursor).collect();
        self.walk_nodes(statements);
    }

    fn walk_nodes(&mut self, statements: Vec<Node>) {
        for statement in statements {
            if statement.start_byte() >= self.offset {
                break;
            }
            if statement.kind() == "comment" {
                self.doc_comment(statement);
                continue;
            }
            if self.is_complete(&statement) {
                tracing::trace!(kind = statement.kind(), "replaying statement");
                self.statement(statement);
                self.pending.clear();
            } else {
                self.statement_at_cursor(statement);
                break;
            }
        }
    }

    fn is_complete(&self, node: &Node) -> bool {
        node.end_byte() < self.offset || (node.end_byte() == self.offset && !node.has_error())
    }

    fn contains_cursor(&self, node: &Node) -> bool {
        node.start_byte() < self.offset && self.offset <= node.end_byte()
    }

    fn resolve(&self, node: Node) -> TypeString {
        ExpressionTypeResolver::new(self.ctx, &self.table).resolve(&node)
    }

    fn text(&self, node: &Node) -> &'b str {
        node_text(node, self.ctx.source)
    }

    /// Inline `/** @var Type $name */` annotations.
    fn doc_comment(&mut self, comment: Node) {
        let text = self.text(&comment);
        if !text.starts_with("/**") {
            return;
        }
        let Some(doc) = phpdoc::parse(text) else {
            return;
        };
        for tag in doc.var_tags() {
            let ty = self.bind_self(&TypeString::parse_lossy(&tag.type_string).name_resolve(self.ctx.names));
            if !tag.name.is_empty() {
                self.table.set(tag.name.clone(), ty.clone());
            }
            self.pending.push((tag.name.clone(), ty));
        }
    }

    // ---- completed statements ----

    fn statement(&mut self, node: Node) {
        match node.kind() {
            "expression_statement" => {
                let pending = std::mem::take(&mut self.pending);
                self.scan(node);
                self.apply_pending(node, pending);
            }
            "compound_statement" | "colon_block" => self.walk_statements(node),
            "if_statement" => self.if_statement(node),
            "switch_statement" => self.switch_statement(node),
            "while_statement" | "do_statement" | "for_statement" => self.loop_statement(node),
            "foreach_statement" => self.foreach_statement(node),
            "try_statement" => {
                if let Some(finally) = self.try_branches(node) {
                    self.statement(finally);
                }
            }
            "global_declaration" => {
                for variable in named_children(node) {
                    let name = self.text(&variable);
                    if variable.kind() == "variable_name" && !self.table.contains(name) {
                        self.table.set(name, TypeString::unknown());
                    }
                }
            }
            "function_static_declaration" => {
                for declaration in named_children(node) {
                    let Some(name) = declaration.child_by_field_name("name") else {
                        continue;
                    };
                    let ty = declaration
                        .child_by_field_name("value")
                        .map(|value| self.resolve(value))
                        .unwrap_or_default();
                    self.table.set(self.text(&name), ty);
                }
            }
            "namespace_definition" => {
                if let Some(body) = node.child_by_field_name("body") {
                    self.walk_statements(body);
                }
            }
            kind if is_declaration(kind) => {}
            _ => self.scan(node),
        }
    }

    fn apply_pending(&mut self, statement: Node, pending: Vec<(String, TypeString)>) {
        if pending.is_empty() {
            return;
        }
        let target = named_children(statement)
            .into_iter()
            .next()
            .filter(|e| {
                matches!(
                    e.kind(),
                    "assignment_expression" | "reference_assignment_expression"
                )
            })
            .and_then(|e| e.child_by_field_name("left"))
            .filter(|left| left.kind() == "variable_name")
            .map(|left| self.text(&left));
        for (name, ty) in pending {
            if !name.is_empty() {
                self.table.set(name, ty);
            } else if let Some(target) = target {
                self.table.set(target, ty);
            }
        }
    }

    fn if_statement(&mut self, node: Node) {
        if let Some(condition) = node.child_by_field_name("condition") {
            self.scan(condition);
        }
        self.table.begin_branches();
        let mut exhaustive = false;
        if let Some(body) = node.child_by_field_name("body") {
            self.table.begin_branch();
            self.statement(body);
            self.table.end_branch();
        }
        for alternative in alternatives(node) {
            exhaustive |= alternative.kind() == "else_clause";
            self.table.begin_branch();
            if let Some(condition) = alternative.child_by_field_name("condition") {
                self.scan(condition);
            }
            if let Some(body) = alternative.child_by_field_name("body") {
                self.statement(body);
            }
            self.table.end_branch();
        }
        self.table.end_branches(exhaustive);
    }

    fn switch_statement(&mut self, node: Node) {
        if let Some(condition) = node.child_by_field_name("condition") {
            self.scan(condition);
        }
        let Some(block) = node.child_by_field_name("body") else {
            return;
        };
        self.table.begin_branches();
        let mut exhaustive = false;
        for case in named_children(block) {
            match case.kind() {
                "case_statement" => {}
                "default_statement" => exhaustive = true,
                _ => continue,
            }
            self.table.begin_branch();
            if let Some(value) = case.child_by_field_name("value") {
                self.scan(value);
            }
            self.walk_nodes(case_statements(case));
            self.table.end_branch();
        }
        self.table.end_branches(exhaustive);
    }

    /// `while`, `do` and `for`: one branch merged with the zero-iteration
    /// case, except `do` which always runs once.
    fn loop_statement(&mut self, node: Node) {
        let body = node.child_by_field_name("body");
        for part in named_children(node) {
            if Some(part.id()) != body.map(|b| b.id()) {
                self.scan(part);
            }
        }
        self.table.begin_branches();
        self.table.begin_branch();
        if let Some(body) = body {
            self.statement(body);
        }
        self.table.end_branch();
        self.table.end_branches(node.kind() == "do_statement");
    }

    fn foreach_statement(&mut self, node: Node) {
        let Some((iterable, target)) = foreach_header(node) else {
            return;
        };
        self.scan(iterable);
        let element = self.resolve(iterable).array_dereference();
        self.table.begin_branches();
        self.table.begin_branch();
        self.seed_foreach(target, element);
        if let Some(body) = node.child_by_field_name("body") {
            self.statement(body);
        }
        self.table.end_branch();
        self.table.end_branches(false);
    }

    /// Applies the try body and catch blocks as exclusive branches and
    /// returns the `finally` body, if any.
    fn try_branches<'t>(&mut self, node: Node<'t>) -> Option<Node<'t>> {
        self.table.begin_branches();
        self.table.begin_branch();
        if let Some(body) = node.child_by_field_name("body") {
            self.statement(body);
        }
        self.table.end_branch();
        let mut finally = None;
        for clause in named_children(node) {
            match clause.kind() {
                "catch_clause" => {
                    self.table.begin_branch();
                    self.seed_catch(clause);
                    if let Some(body) = clause.child_by_field_name("body") {
                        self.statement(body);
                    }
                    self.table.end_branch();
                }
                "finally_clause" => finally = clause.child_by_field_name("body"),
                _ => {}
            }
        }
        self.table.end_branches(true);
        finally
    }

    fn seed_catch(&mut self, clause: Node) {
        let Some(name) = clause.child_by_field_name("name") else {
            return;
        };
        let mut ty = TypeString::unknown();
        if let Some(types) = clause.child_by_field_name("type") {
            for caught in named_children(types) {
                let class = self.ctx.names.resolve_class(self.text(&caught));
                ty.union_with(&TypeString::atom(&class));
            }
        }
        let ty = self.bind_self(&ty);
        self.table.set(self.text(&name), ty);
    }

    fn seed_foreach(&mut self, target: Node, element: TypeString) {
        match target.kind() {
            "pair" => {
                let parts = named_children(target);
                if let [key, .., value] = parts.as_slice() {
                    if key.kind() == "variable_name" {
                        let key_type = TypeString::atom("int").union(&TypeString::atom("string"));
                        self.table.set(self.text(key), key_type);
                    }
                    self.seed_foreach(*value, element);
                }
            }
            "by_ref" => {
                if let Some(inner) = named_children(target).into_iter().next() {
                    self.seed_foreach(inner, element);
                }
            }
            "variable_name" => {
                let name = self.text(&target);
                // Keep an `@var` annotation when the element type is unknown.
                if element.is_empty() && !self.table.get(name).is_empty() {
                    return;
                }
                self.table.set(name, element);
            }
            "list_literal" | "array_creation_expression" => self.assign_target(target, element),
            _ => {}
        }
    }

    /// Applies the assignments inside an expression, innermost first.
    fn scan(&mut self, node: Node) {
        if is_declaration(node.kind())
            || matches!(node.kind(), "anonymous_function" | "arrow_function")
        {
            return;
        }
        for child in named_children(node) {
            self.scan(child);
        }
        match node.kind() {
            "assignment_expression" | "reference_assignment_expression" => {
                let (Some(left), Some(right)) = (
                    node.child_by_field_name("left"),
                    node.child_by_field_name("right"),
                ) else {
                    return;
                };
                let ty = self.resolve(right);
                self.assign_target(left, ty);
            }
            "augmented_assignment_expression" => {
                if let Some(left) = node.child_by_field_name("left") {
                    let ty = self.resolve(node);
                    self.assign_target(left, ty);
                }
            }
            _ => {}
        }
    }

    fn assign_target(&mut self, target: Node, ty: TypeString) {
        match target.kind() {
            "variable_name" => self.table.set(self.text(&target), ty),
            "by_ref" => {
                if let Some(inner) = named_children(target).into_iter().next() {
                    self.assign_target(inner, ty);
                }
            }
            "list_literal" | "array_creation_expression" => {
                let element = ty.array_dereference();
                for entry in destructure_targets(target) {
                    self.assign_target(entry, element.clone());
                }
            }
            // `$items[] = $value`
            "subscript_expression" => {
                let Some(base) = named_children(target).into_iter().next() else {
                    return;
                };
                if base.kind() != "variable_name" || ty.is_empty() {
                    return;
                }
                let name = self.text(&base);
                let existing = self.table.get(name);
                let appended = ty.arrayify();
                if existing.is_empty() || existing == TypeString::atom("array") {
                    self.table.set(name, appended);
                } else if existing.atoms().any(|atom| atom.ends_with("[]")) {
                    self.table.set(name, existing.union(&appended));
                }
            }
            _ => {}
        }
    }

    // ---- the statement containing the cursor ----

    fn statement_at_cursor(&mut self, node: Node) {
        match node.kind() {
            "compound_statement" | "colon_block" => self.walk_statements(node),
            "namespace_definition" => {
                if let Some(body) = node.child_by_field_name("body") {
                    self.walk_statements(body);
                }
            }
            "if_statement" => self.if_at_cursor(node),
            "switch_statement" => self.switch_at_cursor(node),
            "while_statement" | "do_statement" | "for_statement" => self.loop_at_cursor(node),
            "foreach_statement" => self.foreach_at_cursor(node),
            "try_statement" => self.try_at_cursor(node),
            kind if is_declaration(kind) => {}
            _ => self.expression_at_cursor(node),
        }
    }

    /// Applies what precedes the cursor inside `node` and descends into the
    /// child that contains it.
    fn expression_at_cursor(&mut self, node: Node) {
        match node.kind() {
            "anonymous_function" | "arrow_function" => return self.enter_closure(node),
            kind if is_declaration(kind) => return,
            _ => {}
        }
        for child in named_children(node) {
            if child.start_byte() >= self.offset {
                break;
            }
            let statement = is_statement(child.kind());
            if self.contains_cursor(&child) && !(statement && self.is_complete(&child)) {
                if statement {
                    self.statement_at_cursor(child);
                } else {
                    self.expression_at_cursor(child);
                }
                break;
            }
            if statement {
                self.statement(child);
            } else {
                self.scan(child);
            }
        }
    }

    fn if_at_cursor(&mut self, node: Node) {
        if let Some(condition) = node.child_by_field_name("condition") {
            if self.contains_cursor(&condition) {
                return self.expression_at_cursor(condition);
            }
            self.scan(condition);
        }
        if let Some(body) = node.child_by_field_name("body") {
            if self.contains_cursor(&body) {
                return self.statement_at_cursor(body);
            }
        }
        // Only the arm holding the cursor applies; earlier arms are exclusive.
        for alternative in alternatives(node) {
            if !self.contains_cursor(&alternative) {
                continue;
            }
            if let Some(condition) = alternative.child_by_field_name("condition") {
                if self.contains_cursor(&condition) {
                    return self.expression_at_cursor(condition);
                }
                self.scan(condition);
            }
            if let Some(body) = alternative.child_by_field_name("body") {
                self.statement_at_cursor(body);
            }
            return;
        }
    }

    fn switch_at_cursor(&mut self, node: Node) {
        if let Some(condition) = node.child_by_field_name("condition") {
            if self.contains_cursor(&condition) {
                return self.expression_at_cursor(condition);
            }
            self.scan(condition);
        }
        let Some(block) = node.child_by_field_name("body") else {
            return;
        };
        let Some(case) = named_children(block)
            .into_iter()
            .find(|case| self.contains_cursor(case))
        else {
            return;
        };
        if let Some(value) = case.child_by_field_name("value") {
            if self.contains_cursor(&value) {
                return self.expression_at_cursor(value);
            }
            self.scan(value);
        }
        self.walk_nodes(case_statements(case));
    }

    fn loop_at_cursor(&mut self, node: Node) {
        let body = node.child_by_field_name("body");
        for part in named_children(node) {
            if part.start_byte() >= self.offset {
                break;
            }
            if Some(part.id()) == body.map(|b| b.id()) {
                self.statement_at_cursor(part);
                return;
            }
            if self.contains_cursor(&part) {
                return self.expression_at_cursor(part);
            }
            self.scan(part);
        }
    }

    fn foreach_at_cursor(&mut self, node: Node) {
        let Some((iterable, target)) = foreach_header(node) else {
            return self.expression_at_cursor(node);
        };
        if self.contains_cursor(&iterable) {
            return self.expression_at_cursor(iterable);
        }
        self.scan(iterable);
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        if self.contains_cursor(&body) {
            let element = self.resolve(iterable).array_dereference();
            self.seed_foreach(target, element);
            self.statement_at_cursor(body);
        }
    }

    fn try_at_cursor(&mut self, node: Node) {
        if let Some(body) = node.child_by_field_name("body") {
            if self.contains_cursor(&body) {
                return self.statement_at_cursor(body);
            }
        }
        for clause in named_children(node) {
            if !self.contains_cursor(&clause) {
                continue;
            }
            match clause.kind() {
                "catch_clause" => {
                    self.seed_catch(clause);
                    if let Some(body) = clause.child_by_field_name("body") {
                        if self.contains_cursor(&body) {
                            self.statement_at_cursor(body);
                        }
                    }
                }
                "finally_clause" => {
                    let _ = self.try_branches(node);
                    if let Some(body) = clause.child_by_field_name("body") {
                        self.statement_at_cursor(body);
                    }
                }
                _ => {}
            }
            return;
        }
    }

    /// Opens the closure's scope with its captured variables and parameters,
    /// then continues toward the cursor inside its body.
    fn enter_closure(&mut self, node: Node) {
        let captured: Vec<(String, TypeString)> = if node.kind() == "arrow_function" {
            self.table
                .variables()
                .into_iter()
                .map(|(name, ty)| (name.to_string(), ty.clone()))
                .collect()
        } else {
            let mut captured = Vec::new();
            if node.child_by_field_name("static_modifier").is_none() && self.table.contains("$this") {
                captured.push(("$this".to_string(), self.table.get("$this")));
            }
            for clause in named_children(node)
                .into_iter()
                .filter(|n| n.kind() == "anonymous_function_use_clause")
            {
                for variable in named_children(clause) {
                    let variable = match variable.kind() {
                        "by_ref" => match named_children(variable).into_iter().next() {
                            Some(inner) => inner,
                            None => continue,
                        },
                        _ => variable,
                    };
                    let name = self.text(&variable);
                    captured.push((name.to_string(), self.table.get(name)));
                }
            }
            captured
        };
        self.table.push_scope(captured);

        let reader = SymbolReader::with_names(self.ctx.source, "", self.ctx.names.clone());
        let closure = reader.read_callable(node);
        self.seed_parameters(&closure);

        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        if !self.contains_cursor(&body) {
            return;
        }
        if body.kind() == "compound_statement" {
            self.walk_statements(body);
        } else {
            self.expression_at_cursor(body);
        }
    }
}

fn is_declaration(kind: &str) -> bool {
    matches!(
        kind,
        "function_definition"
            | "class_declaration"
            | "interface_declaration"
            | "trait_declaration"
            | "enum_declaration"
            | "anonymous_class"
    )
}

fn is_statement(kind: &str) -> bool {
    kind.ends_with("_statement")
        || matches!(
            kind,
            "colon_block" | "global_declaration" | "function_static_declaration"
        )
}

fn alternatives<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name("alternative", &mut cursor)
        .collect()
}

/// Statements of a `case`/`default` arm, comments included.
fn case_statements<'t>(case: Node<'t>) -> Vec<Node<'t>> {
    let value = case.child_by_field_name("value").map(|v| v.id());
    let mut cursor = case.walk();
    case.named_children(&mut cursor)
        .filter(|child| Some(child.id()) != value)
        .collect()
}

/// The iterated expression and the loop target of a `foreach`.
fn foreach_header<'t>(node: Node<'t>) -> Option<(Node<'t>, Node<'t>)> {
    let body = node.child_by_field_name("body").map(|b| b.id());
    let parts: Vec<Node> = named_children(node)
        .into_iter()
        .filter(|part| Some(part.id()) != body)
        .collect();
    Some((*parts.first()?, *parts.get(1)?))
}

/// Assignment targets of a `list(...)` or `[...]` pattern, skipping keys.
fn destructure_targets<'t>(pattern: Node<'t>) -> Vec<Node<'t>> {
    let mut targets = Vec::new();
    for child in named_children(pattern) {
        let child = if child.kind() == "array_element_initializer" {
            match named_children(child).into_iter().last() {
                Some(value) => value,
                None => continue,
            }
        } else {
            child
        };
        if child.next_sibling().is_some_and(|next| next.kind() == "=>") {
            continue;
        }
        targets.push(child);
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::NameResolver;
    use crate::parser::PhpParser;
    use phpscope_core::config::AnalysisConfig;
    use phpscope_core::store::MemorySymbolStore;

    /// Builds the table at the `<|>` marker, seeding the parameters of the
    /// enclosing function.
    fn table_at(marked: &str) -> VariableTable {
        let offset = marked.find("<|>").unwrap();
        let source = marked.replacen("<|>", "", 1);
        let doc = PhpParser::new().unwrap().parse("file:///t.php", &source).unwrap();
        let store = MemorySymbolStore::new();
        store.add_document(doc.uri(), SymbolReader::read_document(&doc));
        let names = NameResolver::at_offset(doc.root_node(), doc.text(), offset);
        let config = AnalysisConfig::default();
        let ctx = InferContext::new(doc.text(), &store, &names, &config);

        let mut scope = doc.root_node();
        let mut node = doc.root_node().descendant_for_byte_range(offset, offset);
        while let Some(current) = node {
            if current.kind() == "function_definition" {
                scope = current;
                break;
            }
            node = current.parent();
        }

        let mut builder = VariableTableBuilder::new(&ctx, offset);
        if scope.kind() == "function_definition" {
            let reader = SymbolReader::with_names(doc.text(), doc.uri(), names.clone());
            builder.seed_parameters(&reader.read_callable(scope));
        }
        builder.build(scope)
    }

    fn ty(table: &VariableTable, name: &str) -> String {
        table.get(name).to_string()
    }

    #[test]
    fn if_else_merges_branch_types() {
        let table = table_at("<?php\nif ($cond) { $x = 1; } else { $x = \"s\"; }\n<|>");
        assert_eq!(ty(&table, "$x"), "int|string");
    }

    #[test]
    fn if_without_else_keeps_previous_type() {
        let table = table_at("<?php\n$x = 1.5;\nif ($cond) { $x = 1; }\n<|>");
        assert_eq!(ty(&table, "$x"), "float|int");
    }

    #[test]
    fn cursor_inside_branch_sees_only_that_branch() {
        let table = table_at("<?php\n$x = 1;\nif ($c) { $x = 'a'; } else { $x = 2.5; <|> }\n");
        assert_eq!(ty(&table, "$x"), "float");
    }

    #[test]
    fn foreach_seeds_value_and_key() {
        let source = "<?php\n/** @param Widget[] $items */\nfunction f($items) {\n    foreach ($items as $k => $v) { <|> }\n}\n";
        let table = table_at(source);
        assert_eq!(ty(&table, "$v"), "Widget");
        assert_eq!(ty(&table, "$k"), "int|string");

        let after = table_at("<?php\nfunction f(Widget ...$items) {\n    foreach ($items as $v) { }\n    <|>\n}\n");
        assert_eq!(ty(&after, "$v"), "Widget");
    }

    #[test]
    fn catch_seeds_union_of_caught_types() {
        let table = table_at(
            "<?php\nnamespace App;\ntry { run(); } catch (\\LogicException | Failure $e) { <|> }\n",
        );
        assert_eq!(ty(&table, "$e"), "App\\Failure|LogicException");
    }

    #[test]
    fn closures_capture_use_variables_and_parameters() {
        let source = "<?php\n$a = 1;\n$b = 'x';\n$f = function (float $p) use ($a) { <|> };\n";
        let table = table_at(source);
        assert_eq!(ty(&table, "$a"), "int");
        assert_eq!(ty(&table, "$p"), "float");
        assert_eq!(ty(&table, "$b"), "");

        let arrow = table_at("<?php\n$a = 1;\n$b = 'x';\n$f = fn(int $p) => $b<|>;\n");
        assert_eq!(ty(&arrow, "$a"), "int");
        assert_eq!(ty(&arrow, "$p"), "int");
    }

    #[test]
    fn inline_var_annotations() {
        let source = "<?php\n/** @var Widget $w */\n$w = make();\n/** @var Gadget */\n$g = make();\n<|>";
        let table = table_at(source);
        assert_eq!(ty(&table, "$w"), "Widget");
        assert_eq!(ty(&table, "$g"), "Gadget");
    }

    #[test]
    fn destructuring_and_append() {
        let source = "<?php\n$pairs = [[1, 2]];\n[$a, $b] = $pairs[0];\n$list = [];\n$list[] = 'x';\n<|>";
        let table = table_at(source);
        assert_eq!(ty(&table, "$a"), "int");
        assert_eq!(ty(&table, "$list"), "string[]");
    }

    #[test]
    fn later_statements_are_ignored() {
        let table = table_at("<?php\n$x = 1;\n<|>\n$x = 'late';\n");
        assert_eq!(ty(&table, "$x"), "int");
    }

    #[test]
    fn augmented_assignment_and_statics() {
        let table = table_at("<?php\nfunction f() {\n    static $count = 0;\n    $s = 1;\n    $s .= 'x';\n    <|>\n}\n");
        assert_eq!(ty(&table, "$count"), "int");
        assert_eq!(ty(&table, "$s"), "string");
    }

    #[test]
    fn loops_merge_with_zero_iterations() {
        let table = table_at("<?php\n$x = 1;\nwhile ($c) { $x = 's'; }\n<|>");
        assert_eq!(ty(&table, "$x"), "int|string");

        let table = table_at("<?php\n$x = 1;\nfor ($i = 0; $i < 3; $i++) { $x = 1.5; }\n<|>");
        assert_eq!(ty(&table, "$x"), "float|int");
        assert_eq!(ty(&table, "$i"), "int");
    }

    #[test]
    fn do_body_always_runs() {
        let table = table_at("<?php\n$x = 1;\ndo { $x = 's'; } while ($c);\n<|>");
        assert_eq!(ty(&table, "$x"), "string");
    }

    #[test]
    fn switch_with_default_is_exhaustive() {
        let source = "<?php\n$x = true;\nswitch ($k) {\n    case 1: $x = 1; break;\n    case 2: $x = 's'; break;\n    default: $x = 1.5;\n}\n<|>";
        assert_eq!(ty(&table_at(source), "$x"), "float|int|string");
    }

    #[test]
    fn switch_without_default_keeps_previous_type() {
        let source = "<?php\n$x = true;\nswitch ($k) {\n    case 1: $x = 1; break;\n}\n<|>";
        assert_eq!(ty(&table_at(source), "$x"), "bool|int");
    }

    #[test]
    fn finally_sees_try_and_catch_merged() {
        let source = "<?php\n$y = 1;\ntry {\n    $y = 's';\n} catch (Failure $e) {\n} finally {\n    $z = $y;\n}\n<|>";
        let table = table_at(source);
        assert_eq!(ty(&table, "$y"), "int|string");
        assert_eq!(ty(&table, "$z"), "int|string");
    }
}
