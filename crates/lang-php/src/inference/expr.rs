//! Expression type resolution.
//!
//! One exhaustive match over [`ExprKind`]. Every branch is total: a
//! sub-expression that cannot be resolved contributes the unknown type.

use super::context::InferContext;
use super::members::{MemberKind, member_type};
use super::scope::VariableTable;
use crate::naming::ImportKind;
use crate::parser::ast::{children, named_children, node_text};
use crate::parser::kinds::ExprKind;
use phpscope_api::models::types::TypeString;
use tree_sitter::Node;

pub struct ExpressionTypeResolver<'a, 'b> {
    ctx: &'a InferContext<'b>,
    variables: &'a VariableTable,
}

impl<'a, 'b> ExpressionTypeResolver<'a, 'b> {
    pub fn new(ctx: &'a InferContext<'b>, variables: &'a VariableTable) -> Self {
        Self { ctx, variables }
    }

    pub fn resolve(&self, node: &Node) -> TypeString {
        self.infer(*node, 0)
    }

    fn infer(&self, node: Node, depth: usize) -> TypeString {
        if depth > self.ctx.config.max_inference_depth {
            tracing::debug!(kind = node.kind(), "inference depth exceeded");
            return TypeString::unknown();
        }
        let depth = depth + 1;

        match ExprKind::of(&node) {
            ExprKind::Variable => self.variable(node),
            ExprKind::Integer => TypeString::atom("int"),
            ExprKind::Float => TypeString::atom("float"),
            ExprKind::String | ExprKind::ShellCommand => TypeString::atom("string"),
            ExprKind::Boolean => TypeString::atom("bool"),
            ExprKind::Null => TypeString::atom("null"),
            ExprKind::Print => TypeString::atom("int"),
            ExprKind::Array => self.array_literal(node, depth),
            ExprKind::ConstantName => self.constant(node),
            ExprKind::Binary => self.binary(node, depth),
            ExprKind::Unary => self.unary(node, depth),
            ExprKind::Conditional => self.conditional(node, depth),
            ExprKind::Assignment => self.field(node, "right", depth),
            ExprKind::AugmentedAssignment => self.augmented(node, depth),
            ExprKind::Cast => cast_type(node, self.ctx.source),
            ExprKind::MemberAccess => {
                let receiver = self.field(node, "object", depth);
                match self.member_name(node) {
                    Some(name) => member_type(
                        self.ctx,
                        &receiver,
                        MemberKind::Property,
                        &format!("${name}"),
                        None,
                    ),
                    None => TypeString::unknown(),
                }
            }
            ExprKind::MemberCall => {
                let receiver = self.field(node, "object", depth);
                match self.member_name(node) {
                    Some(name) => member_type(self.ctx, &receiver, MemberKind::Method, name, None),
                    None => TypeString::unknown(),
                }
            }
            ExprKind::ScopedCall => self.scoped(node, MemberKind::Method, depth),
            ExprKind::ScopedPropertyAccess => self.scoped(node, MemberKind::Property, depth),
            ExprKind::ClassConstantAccess => self.class_constant(node, depth),
            ExprKind::Subscript => {
                let Some(base) = named_children(node).into_iter().next() else {
                    return TypeString::unknown();
                };
                let base = self.infer(base, depth);
                let mut element = base.array_dereference();
                if base.contains("string") {
                    element.union_with(&TypeString::atom("string"));
                }
                element
            }
            ExprKind::ObjectCreation => self.object_creation(node),
            ExprKind::FunctionCall => self.function_call(node),
            ExprKind::Closure => TypeString::atom("Closure"),
            ExprKind::Clone | ExprKind::Parenthesized | ExprKind::ErrorSuppression => {
                self.first_named(node, depth)
            }
            ExprKind::Update => match node.child_by_field_name("argument") {
                Some(argument) => self.infer(argument, depth),
                None => self.first_named(node, depth),
            },
            ExprKind::Match => self.match_arms(node, depth),
            ExprKind::Sequence => match named_children(node).into_iter().last() {
                Some(last) => self.infer(last, depth),
                None => TypeString::unknown(),
            },
            ExprKind::DynamicVariable
            | ExprKind::Include
            | ExprKind::Throw
            | ExprKind::Yield
            | ExprKind::Error
            | ExprKind::Other => TypeString::unknown(),
        }
    }

    fn variable(&self, node: Node) -> TypeString {
        let name = node_text(&node, self.ctx.source);
        let ty = self.variables.get(name);
        if ty.is_empty() && name == "$this" {
            return self
                .ctx
                .class
                .self_class
                .as_deref()
                .map(TypeString::atom)
                .unwrap_or_default();
        }
        ty
    }

    fn field(&self, node: Node, field: &str, depth: usize) -> TypeString {
        node.child_by_field_name(field)
            .map(|child| self.infer(child, depth))
            .unwrap_or_default()
    }

    fn first_named(&self, node: Node, depth: usize) -> TypeString {
        named_children(node)
            .into_iter()
            .next()
            .map(|child| self.infer(child, depth))
            .unwrap_or_default()
    }

    fn member_name(&self, node: Node) -> Option<&'b str> {
        let name = node.child_by_field_name("name")?;
        if name.kind() != "name" {
            return None;
        }
        Some(node_text(&name, self.ctx.source))
    }

    /// `T[]` when every element resolves, plain `array` otherwise.
    fn array_literal(&self, node: Node, depth: usize) -> TypeString {
        let mut elements = TypeString::unknown();
        let mut count = 0;
        for element in named_children(node) {
            if element.kind() != "array_element_initializer" {
                continue;
            }
            let Some(value) = named_children(element).into_iter().last() else {
                continue;
            };
            if value.kind() == "variadic_unpacking" {
                return TypeString::atom("array");
            }
            let ty = self.infer(value, depth);
            if ty.is_empty() {
                return TypeString::atom("array");
            }
            elements.union_with(&ty);
            count += 1;
        }
        if count == 0 {
            TypeString::atom("array")
        } else {
            elements.arrayify()
        }
    }

    fn constant(&self, node: Node) -> TypeString {
        let text = node_text(&node, self.ctx.source);
        match text.to_ascii_lowercase().trim_start_matches('\\') {
            "true" | "false" => return TypeString::atom("bool"),
            "null" => return TypeString::atom("null"),
            _ => {}
        }
        self.ctx
            .names
            .resolve_candidates(text, ImportKind::Constant)
            .iter()
            .find_map(|fqn| self.ctx.store.find_constant(fqn))
            .map(|constant| constant.type_string.clone())
            .unwrap_or_default()
    }

    fn binary(&self, node: Node, depth: usize) -> TypeString {
        let operator = operator_text(node, self.ctx.source);
        let left = || self.field(node, "left", depth);
        let right = || self.field(node, "right", depth);
        match operator.to_ascii_lowercase().as_str() {
            "." => TypeString::atom("string"),
            "==" | "!=" | "===" | "!==" | "<>" | "<" | ">" | "<=" | ">=" | "&&" | "||"
            | "and" | "or" | "xor" | "instanceof" => TypeString::atom("bool"),
            "<=>" | "%" | "&" | "|" | "^" | "<<" | ">>" => TypeString::atom("int"),
            "??" => left().without_null().union(&right()),
            "+" => {
                let (l, r) = (left(), right());
                if l.contains("array") && r.contains("array") {
                    l.union(&r)
                } else {
                    arithmetic(&l, &r)
                }
            }
            "-" | "*" | "**" => arithmetic(&left(), &right()),
            "/" => division(&left(), &right()),
            _ => TypeString::unknown(),
        }
    }

    fn unary(&self, node: Node, depth: usize) -> TypeString {
        let operand = node
            .child_by_field_name("argument")
            .or_else(|| named_children(node).into_iter().last());
        let operand_type = || {
            operand
                .map(|operand| self.infer(operand, depth))
                .unwrap_or_default()
        };
        match operator_text(node, self.ctx.source) {
            "!" => TypeString::atom("bool"),
            "~" => TypeString::atom("int"),
            _ => numeric(&operand_type()),
        }
    }

    fn conditional(&self, node: Node, depth: usize) -> TypeString {
        let alternative = self.field(node, "alternative", depth);
        match node.child_by_field_name("body") {
            Some(body) => self.infer(body, depth).union(&alternative),
            // `a ?: b` yields `a` only when it is truthy.
            None => self
                .field(node, "condition", depth)
                .without_null()
                .union(&alternative),
        }
    }

    fn augmented(&self, node: Node, depth: usize) -> TypeString {
        let left = || self.field(node, "left", depth);
        let right = || self.field(node, "right", depth);
        match operator_text(node, self.ctx.source) {
            ".=" => TypeString::atom("string"),
            "??=" => left().without_null().union(&right()),
            "/=" => division(&left(), &right()),
            "%=" | "&=" | "|=" | "^=" | "<<=" | ">>=" => TypeString::atom("int"),
            "+=" | "-=" | "*=" | "**=" => {
                let (l, r) = (left(), right());
                if l.contains("array") && r.contains("array") {
                    l.union(&r)
                } else {
                    arithmetic(&l, &r)
                }
            }
            _ => TypeString::unknown(),
        }
    }

    /// `Scope::member` where the scope is a class name, a relative keyword
    /// or an expression.
    fn scoped(&self, node: Node, kind: MemberKind, depth: usize) -> TypeString {
        let (Some(scope), Some(name)) = (
            node.child_by_field_name("scope"),
            node.child_by_field_name("name"),
        ) else {
            return TypeString::unknown();
        };
        let name = node_text(&name, self.ctx.source);
        if name.is_empty() {
            return TypeString::unknown();
        }
        let (receiver, bound) = self.scope_type(scope, depth);
        member_type(self.ctx, &receiver, kind, name, bound.as_deref())
    }

    fn class_constant(&self, node: Node, depth: usize) -> TypeString {
        let parts = named_children(node);
        let (Some(scope), Some(name)) = (parts.first(), parts.last()) else {
            return TypeString::unknown();
        };
        if parts.len() < 2 {
            return TypeString::unknown();
        }
        let name = node_text(name, self.ctx.source);
        if name.eq_ignore_ascii_case("class") {
            return TypeString::atom("string");
        }
        let (receiver, bound) = self.scope_type(*scope, depth);
        member_type(self.ctx, &receiver, MemberKind::Constant, name, bound.as_deref())
    }

    /// The class type of a scope and the class `static` binds to, when it
    /// differs from the scope itself.
    fn scope_type(&self, scope: Node, depth: usize) -> (TypeString, Option<String>) {
        match scope.kind() {
            "relative_scope" | "name" | "qualified_name" | "relative_name" => {
                let text = node_text(&scope, self.ctx.source);
                let class = self
                    .ctx
                    .class_reference(text)
                    .map(|class| TypeString::atom(&class))
                    .unwrap_or_default();
                let bound = if text.eq_ignore_ascii_case("parent") {
                    self.ctx.class.self_class.clone()
                } else {
                    None
                };
                (class, bound)
            }
            _ => (self.infer(scope, depth), None),
        }
    }

    fn object_creation(&self, node: Node) -> TypeString {
        let Some(class) = named_children(node).into_iter().next() else {
            return TypeString::unknown();
        };
        match class.kind() {
            "name" | "qualified_name" | "relative_name" => self
                .ctx
                .class_reference(node_text(&class, self.ctx.source))
                .map(|fqn| TypeString::atom(&fqn))
                .unwrap_or_default(),
            _ => TypeString::unknown(),
        }
    }

    fn function_call(&self, node: Node) -> TypeString {
        let Some(function) = node.child_by_field_name("function") else {
            return TypeString::unknown();
        };
        if !matches!(function.kind(), "name" | "qualified_name" | "relative_name") {
            return TypeString::unknown();
        }
        let text = node_text(&function, self.ctx.source);
        let candidates = self.ctx.names.resolve_candidates(text, ImportKind::Function);
        match candidates
            .iter()
            .find_map(|fqn| self.ctx.store.find_function(fqn))
        {
            Some(function) => function.type_string.clone(),
            None => {
                tracing::debug!(function = text, "function not found");
                TypeString::unknown()
            }
        }
    }

    fn match_arms(&self, node: Node, depth: usize) -> TypeString {
        let Some(block) = node.child_by_field_name("body") else {
            return TypeString::unknown();
        };
        let mut result = TypeString::unknown();
        for arm in named_children(block) {
            if let Some(value) = arm.child_by_field_name("return_expression") {
                result.union_with(&self.infer(value, depth));
            }
        }
        result
    }
}

/// The operator token of a binary, unary or assignment expression.
fn operator_text<'s>(node: Node, source: &'s str) -> &'s str {
    node.child_by_field_name("operator")
        .or_else(|| children(node).into_iter().find(|c| !c.is_named()))
        .map(|op| node_text(&op, source))
        .unwrap_or("")
}

fn cast_type(node: Node, source: &str) -> TypeString {
    let Some(target) = node.child_by_field_name("type") else {
        return TypeString::unknown();
    };
    let keyword = node_text(&target, source)
        .trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace())
        .to_ascii_lowercase();
    match keyword.as_str() {
        "int" | "integer" => TypeString::atom("int"),
        "bool" | "boolean" => TypeString::atom("bool"),
        "float" | "double" | "real" => TypeString::atom("float"),
        "string" | "binary" => TypeString::atom("string"),
        "array" => TypeString::atom("array"),
        "object" => TypeString::atom("object"),
        "unset" => TypeString::atom("null"),
        _ => TypeString::unknown(),
    }
}

fn int_or_float() -> TypeString {
    TypeString::atom("int").union(&TypeString::atom("float"))
}

/// Result of `+`, `-` and `*`: float wins, two ints stay int.
fn arithmetic(left: &TypeString, right: &TypeString) -> TypeString {
    if left.contains("float") || right.contains("float") {
        TypeString::atom("float")
    } else if is_int(left) && is_int(right) {
        TypeString::atom("int")
    } else {
        int_or_float()
    }
}

fn division(left: &TypeString, right: &TypeString) -> TypeString {
    if left.contains("float") || right.contains("float") {
        TypeString::atom("float")
    } else {
        int_or_float()
    }
}

fn numeric(operand: &TypeString) -> TypeString {
    if operand.contains("float") && !operand.contains("int") {
        TypeString::atom("float")
    } else if is_int(operand) {
        TypeString::atom("int")
    } else {
        int_or_float()
    }
}

fn is_int(ty: &TypeString) -> bool {
    ty.len() == 1 && ty.contains("int")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::context::ClassContext;
    use crate::naming::NameResolver;
    use crate::parser::{PhpParser, SymbolReader};
    use phpscope_core::config::AnalysisConfig;
    use phpscope_core::store::MemorySymbolStore;

    /// Resolves the expression of the last expression statement in `source`.
    fn resolve_with(source: &str, variables: &VariableTable, self_class: Option<&str>) -> String {
        let doc = PhpParser::new().unwrap().parse("file:///t.php", source).unwrap();
        let store = MemorySymbolStore::new();
        store.add_document(doc.uri(), SymbolReader::read_document(&doc));
        let names = NameResolver::at_offset(doc.root_node(), doc.text(), doc.text().len());
        let config = AnalysisConfig::default();
        let ctx = InferContext::new(doc.text(), &store, &names, &config).with_class(ClassContext {
            self_class: self_class.map(str::to_string),
            parent_class: None,
        });
        let statement = named_children(doc.root_node())
            .into_iter()
            .filter(|n| n.kind() == "expression_statement")
            .last()
            .unwrap();
        let expr = named_children(statement).into_iter().next().unwrap();
        ExpressionTypeResolver::new(&ctx, variables)
            .resolve(&expr)
            .to_string()
    }

    fn resolve(source: &str) -> String {
        resolve_with(source, &VariableTable::new(), None)
    }

    #[test]
    fn literals_and_operators() {
        assert_eq!(resolve("<?php 1;"), "int");
        assert_eq!(resolve("<?php 1.5;"), "float");
        assert_eq!(resolve("<?php 'a' . 1;"), "string");
        assert_eq!(resolve("<?php 1 + 2;"), "int");
        assert_eq!(resolve("<?php 1 + 2.0;"), "float");
        assert_eq!(resolve("<?php 4 / 2;"), "float|int");
        assert_eq!(resolve("<?php 1 < 2;"), "bool");
        assert_eq!(resolve("<?php !1;"), "bool");
        assert_eq!(resolve("<?php (string) 1;"), "string");
        assert_eq!(resolve("<?php true ? 1 : 'a';"), "int|string");
        assert_eq!(resolve("<?php null;"), "null");
        assert_eq!(resolve("<?php [1, 2];"), "int[]");
        assert_eq!(resolve("<?php [];"), "array");
        assert_eq!(resolve("<?php fn() => 1;"), "Closure");
    }

    #[test]
    fn null_coalescing_drops_null_from_left() {
        let mut variables = VariableTable::new();
        variables.set("$a", "Foo|null".parse().unwrap());
        assert_eq!(resolve_with("<?php $a ?? 1;", &variables, None), "Foo|int");
    }

    #[test]
    fn method_calls_bind_static_to_receiver() {
        let source = r#"<?php
class Builder {
    /** @var string */
    public $name;
    public function withName(string $n): static { return $this; }
    public static function create(): self { return new self(); }
}
class Sub extends Builder {}
(new Sub())->withName("x")->name;
"#;
        assert_eq!(resolve(source), "string");
        let call = source.replace("->name;", ";");
        assert_eq!(resolve(&call), "Sub");
        let call = source.replace("(new Sub())->withName(\"x\")->name;", "Sub::create();");
        assert_eq!(resolve(&call), "Builder");
    }

    #[test]
    fn this_falls_back_to_class_context() {
        let source = "<?php\nclass A { public function me(): static {} }\n$this->me();\n";
        assert_eq!(resolve_with(source, &VariableTable::new(), Some("A")), "A");
    }

    #[test]
    fn constants_functions_and_enum_cases() {
        let source = r#"<?php
namespace App;
const LIMIT = 10;
function make(): \DateTime {}
enum Suit { case Hearts; }
"#;
        assert_eq!(resolve(&format!("{source}LIMIT;")), "int");
        assert_eq!(resolve(&format!("{source}make();")), "DateTime");
        assert_eq!(resolve(&format!("{source}Suit::Hearts;")), "App\\Suit");
        assert_eq!(resolve(&format!("{source}Suit::class;")), "string");
        assert_eq!(resolve(&format!("{source}missing();")), "");
    }

    #[test]
    fn subscript_and_match() {
        let mut variables = VariableTable::new();
        variables.set("$items", "Widget[]".parse().unwrap());
        assert_eq!(resolve_with("<?php $items[0];", &variables, None), "Widget");
        assert_eq!(
            resolve_with("<?php match (1) { 1 => 'a', default => 2 };", &variables, None),
            "int|string"
        );
    }
}
