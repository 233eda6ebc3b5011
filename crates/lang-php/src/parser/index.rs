//! Declaration reader.
//!
//! Walks a parsed document and produces its declaration records. Namespaces
//! own the declarations that follow them; classes own their members;
//! callables own their parameters and the closures in their bodies.

use super::ast::{doc_comment_before, is_name, named_children, node_text, range_of};
use super::kinds::ExprKind;
use super::ParsedDocument;
use crate::naming::{NameResolver, read_use_declaration};
use crate::phpdoc::{self, PhpDoc};
use phpscope_api::models::symbol::{AssociationKind, Modifiers, PhpSymbol, SymbolKind, Visibility};
use phpscope_api::models::types::TypeString;
use std::sync::Arc;
use tree_sitter::Node;

pub const CLOSURE_NAME: &str = "{closure}";

pub struct SymbolReader<'a> {
    source: &'a str,
    uri: &'a str,
    names: NameResolver,
}

impl<'a> SymbolReader<'a> {
    pub fn new(document: &'a ParsedDocument) -> Self {
        Self::with_names(document.text(), document.uri(), NameResolver::default())
    }

    /// A reader for fragments of a document, resolving names with `names`.
    pub fn with_names(source: &'a str, uri: &'a str, names: NameResolver) -> Self {
        Self { source, uri, names }
    }

    /// All top-level records of the document.
    pub fn read_document(document: &ParsedDocument) -> Vec<Arc<PhpSymbol>> {
        SymbolReader::new(document).read_program(document.root_node())
    }

    pub fn read_program(&mut self, root: Node) -> Vec<Arc<PhpSymbol>> {
        let mut out = Vec::new();
        let mut open_namespace: Option<PhpSymbol> = None;

        for statement in named_children(root) {
            if statement.kind() != "namespace_definition" {
                let symbols = self.read_statement(statement);
                match open_namespace.as_mut() {
                    Some(namespace) => namespace.children.extend(symbols),
                    None => out.extend(symbols),
                }
                continue;
            }

            if let Some(namespace) = open_namespace.take() {
                out.push(Arc::new(namespace));
            }
            let name = statement
                .child_by_field_name("name")
                .map(|n| node_text(&n, self.source).to_string())
                .unwrap_or_default();
            let mut namespace = self.symbol(SymbolKind::Namespace, name.clone(), &statement);
            match statement.child_by_field_name("body") {
                Some(body) => {
                    self.names = NameResolver::new(name, Vec::new());
                    namespace.children = self.read_statements(body);
                    self.names = NameResolver::default();
                    out.push(Arc::new(namespace));
                }
                None => {
                    self.names.set_namespace(name);
                    open_namespace = Some(namespace);
                }
            }
        }

        if let Some(namespace) = open_namespace {
            out.push(Arc::new(namespace));
        }
        out
    }

    fn read_statements(&mut self, container: Node) -> Vec<Arc<PhpSymbol>> {
        let mut out = Vec::new();
        for statement in named_children(container) {
            out.extend(self.read_statement(statement));
        }
        out
    }

    fn read_statement(&mut self, statement: Node) -> Vec<Arc<PhpSymbol>> {
        match statement.kind() {
            "namespace_use_declaration" => {
                let imports = read_use_declaration(statement, self.source);
                self.names.add_imports(imports);
                Vec::new()
            }
            "class_declaration" | "interface_declaration" | "trait_declaration"
            | "enum_declaration" => vec![Arc::new(self.read_class(statement))],
            "function_definition" => {
                let mut function = self.read_callable(statement);
                function.name = self.qualify(&function.name);
                vec![Arc::new(function)]
            }
            "const_declaration" => self
                .read_constants(statement, None)
                .into_iter()
                .map(Arc::new)
                .collect(),
            "compound_statement" | "colon_block" => self.read_statements(statement),
            // Conditional declarations such as `if (!function_exists('f')) { function f() {} }`.
            "if_statement" => {
                let mut out = Vec::new();
                if let Some(body) = statement.child_by_field_name("body") {
                    out.extend(self.read_statement(body));
                }
                let mut cursor = statement.walk();
                let alternatives: Vec<_> = statement
                    .children_by_field_name("alternative", &mut cursor)
                    .collect();
                for alternative in alternatives {
                    if let Some(body) = alternative.child_by_field_name("body") {
                        out.extend(self.read_statement(body));
                    }
                }
                out
            }
            "expression_statement" => {
                let mut out: Vec<Arc<PhpSymbol>> = self
                    .read_define(statement)
                    .into_iter()
                    .map(Arc::new)
                    .collect();
                out.extend(self.collect_closures(statement));
                out
            }
            _ => self.collect_closures(statement),
        }
    }

    fn read_class(&mut self, node: Node) -> PhpSymbol {
        let kind = match node.kind() {
            "interface_declaration" => SymbolKind::Interface,
            "trait_declaration" => SymbolKind::Trait,
            "enum_declaration" => SymbolKind::Enum,
            _ => SymbolKind::Class,
        };
        let short_name = node
            .child_by_field_name("name")
            .map(|n| node_text(&n, self.source))
            .unwrap_or("");
        let fqn = self.qualify(short_name);
        let doc = self.doc_for(&node);

        let mut class = self
            .symbol(kind, fqn.clone(), &node)
            .with_modifiers(read_modifiers(node, self.source));
        class.description = description(doc.as_ref());

        for child in named_children(node) {
            let association = match child.kind() {
                "base_clause" => AssociationKind::Extends,
                "class_interface_clause" => AssociationKind::Implements,
                _ => continue,
            };
            for name in named_children(child).into_iter().filter(is_name) {
                let resolved = self.names.resolve_class(node_text(&name, self.source));
                class = class.with_association(association, resolved);
            }
        }

        if let Some(body) = node.child_by_field_name("body") {
            for member in named_children(body) {
                match member.kind() {
                    "property_declaration" => {
                        for property in self.read_properties(member, &fqn) {
                            class.children.push(Arc::new(property));
                        }
                    }
                    "method_declaration" => {
                        let method = self.read_method(member, &fqn);
                        if method.name.eq_ignore_ascii_case("__construct") {
                            for promoted in self.promoted_properties(member, &method, &fqn) {
                                class.children.push(Arc::new(promoted));
                            }
                        }
                        class.children.push(Arc::new(method));
                    }
                    "const_declaration" => {
                        for constant in self.read_constants(member, Some(&fqn)) {
                            class.children.push(Arc::new(constant));
                        }
                    }
                    "use_declaration" => {
                        for name in named_children(member).into_iter().filter(is_name) {
                            let resolved = self.names.resolve_class(node_text(&name, self.source));
                            class = class.with_association(AssociationKind::Uses, resolved);
                        }
                    }
                    "enum_case" => {
                        if let Some(name) = member.child_by_field_name("name") {
                            let case = self
                                .symbol(SymbolKind::ClassConstant, node_text(&name, self.source), &member)
                                .with_type(TypeString::atom(&fqn))
                                .with_scope(fqn.clone())
                                .with_modifiers(Modifiers {
                                    is_static: true,
                                    ..Modifiers::default()
                                });
                            class.children.push(Arc::new(case));
                        }
                    }
                    _ => {}
                }
            }
        }

        if let Some(doc) = &doc {
            for magic in self.magic_members(doc, &node, &fqn) {
                class.children.push(Arc::new(magic));
            }
        }
        class
    }

    fn read_properties(&self, node: Node, class: &str) -> Vec<PhpSymbol> {
        let modifiers = read_modifiers(node, self.source);
        let declared = self.read_type(node.child_by_field_name("type"));
        let doc = self.doc_for(&node);

        named_children(node)
            .into_iter()
            .filter(|n| n.kind() == "property_element")
            .filter_map(|element| {
                let name = node_text(&element.child_by_field_name("name")?, self.source);
                let default = element.child_by_field_name("default_value");
                let mut ty = refine(declared.clone(), || {
                    doc.as_ref()
                        .and_then(|d| d.find_var_tag(name))
                        .map(|tag| self.doc_type(&tag.type_string))
                });
                if ty.is_empty() {
                    ty = default.map(|v| literal_type(&v, self.source)).unwrap_or_default();
                }
                let mut property = self
                    .symbol(SymbolKind::Property, name, &element)
                    .with_type(ty)
                    .with_modifiers(modifiers)
                    .with_scope(class);
                property.description = description(doc.as_ref());
                property.value = default.map(|v| node_text(&v, self.source).to_string());
                Some(property)
            })
            .collect()
    }

    fn read_method(&self, node: Node, class: &str) -> PhpSymbol {
        let mut method = self.read_callable(node);
        method.kind = SymbolKind::Method;
        method.modifiers = Modifiers {
            is_anonymous: false,
            ..read_modifiers(node, self.source)
        };
        method.scope = Some(class.to_string());
        method
    }

    /// Constructor parameters with a visibility become properties.
    fn promoted_properties(&self, node: Node, constructor: &PhpSymbol, class: &str) -> Vec<PhpSymbol> {
        let Some(params) = node.child_by_field_name("parameters") else {
            return Vec::new();
        };
        named_children(params)
            .into_iter()
            .filter(|p| p.kind() == "property_promotion_parameter")
            .filter_map(|param| {
                let name = parameter_name(&param, self.source)?;
                let ty = constructor
                    .parameters()
                    .find(|p| p.name == name)
                    .map(|p| p.type_string.clone())
                    .unwrap_or_default();
                let mut modifiers = read_modifiers(param, self.source);
                modifiers.is_readonly |= param.child_by_field_name("readonly").is_some();
                Some(
                    self.symbol(SymbolKind::Property, name, &param)
                        .with_type(ty)
                        .with_modifiers(modifiers)
                        .with_scope(class),
                )
            })
            .collect()
    }

    /// A function, method, closure or arrow function with its parameters and
    /// the closures declared in its body.
    pub fn read_callable(&self, node: Node) -> PhpSymbol {
        let anonymous = matches!(node.kind(), "anonymous_function" | "arrow_function");
        let name = if anonymous {
            CLOSURE_NAME.to_string()
        } else {
            node.child_by_field_name("name")
                .map(|n| node_text(&n, self.source).to_string())
                .unwrap_or_default()
        };
        let doc = self.doc_for(&node);

        let return_type = refine(self.read_type(node.child_by_field_name("return_type")), || {
            doc.as_ref()
                .and_then(|d| d.return_tag())
                .map(|tag| self.doc_type(&tag.type_string))
        });

        let mut callable = self
            .symbol(SymbolKind::Function, name, &node)
            .with_type(return_type)
            .with_modifiers(Modifiers {
                is_anonymous: anonymous,
                is_static: node.child_by_field_name("static_modifier").is_some(),
                ..Modifiers::default()
            });
        callable.description = description(doc.as_ref());

        if let Some(params) = node.child_by_field_name("parameters") {
            for param in self.read_parameters(params, doc.as_ref()) {
                callable.children.push(Arc::new(param));
            }
        }
        if let Some(body) = node.child_by_field_name("body") {
            callable.children.extend(self.collect_closures(body));
        }
        callable
    }

    fn read_parameters(&self, params: Node, doc: Option<&PhpDoc>) -> Vec<PhpSymbol> {
        named_children(params)
            .into_iter()
            .filter(|p| {
                matches!(
                    p.kind(),
                    "simple_parameter" | "variadic_parameter" | "property_promotion_parameter"
                )
            })
            .filter_map(|param| {
                let name = parameter_name(&param, self.source)?;
                let mut ty = refine(self.read_type(param.child_by_field_name("type")), || {
                    doc.and_then(|d| d.find_param_tag(&name))
                        .map(|tag| self.doc_type(&tag.type_string))
                });
                let is_variadic = param.kind() == "variadic_parameter";
                if is_variadic {
                    ty = ty.arrayify();
                }
                let mut symbol = self
                    .symbol(SymbolKind::Parameter, name, &param)
                    .with_type(ty)
                    .with_modifiers(Modifiers {
                        is_variadic,
                        ..Modifiers::default()
                    });
                symbol.value = param
                    .child_by_field_name("default_value")
                    .map(|v| node_text(&v, self.source).to_string());
                Some(symbol)
            })
            .collect()
    }

    fn read_constants(&self, node: Node, class: Option<&str>) -> Vec<PhpSymbol> {
        let modifiers = read_modifiers(node, self.source);
        let declared = self.read_type(node.child_by_field_name("type"));
        named_children(node)
            .into_iter()
            .filter(|n| n.kind() == "const_element")
            .filter_map(|element| {
                let parts = named_children(element);
                let name_node = parts.iter().find(|n| n.kind() == "name")?;
                let value = parts.iter().find(|n| n.id() != name_node.id());
                let name = node_text(name_node, self.source);
                let ty = if declared.is_empty() {
                    value.map(|v| literal_type(v, self.source)).unwrap_or_default()
                } else {
                    declared.clone()
                };
                let mut constant = match class {
                    Some(class) => self
                        .symbol(SymbolKind::ClassConstant, name, &element)
                        .with_scope(class)
                        .with_modifiers(Modifiers {
                            is_static: true,
                            ..modifiers
                        }),
                    None => self.symbol(SymbolKind::Constant, self.qualify(name), &element),
                }
                .with_type(ty);
                constant.value = value.map(|v| node_text(v, self.source).to_string());
                Some(constant)
            })
            .collect()
    }

    /// `define('NAME', value);`
    fn read_define(&self, statement: Node) -> Option<PhpSymbol> {
        let call = named_children(statement).into_iter().next()?;
        if call.kind() != "function_call_expression" {
            return None;
        }
        let function = call.child_by_field_name("function")?;
        if !node_text(&function, self.source)
            .trim_start_matches('\\')
            .eq_ignore_ascii_case("define")
        {
            return None;
        }
        let arguments: Vec<Node> = named_children(call.child_by_field_name("arguments")?)
            .into_iter()
            .filter_map(|arg| named_children(arg).into_iter().last())
            .collect();
        let name_arg = arguments.first()?;
        if name_arg.kind() != "string" && name_arg.kind() != "encapsed_string" {
            return None;
        }
        let name = node_text(name_arg, self.source)
            .trim_matches(|c| c == '\'' || c == '"')
            .trim_start_matches('\\');
        if name.is_empty() {
            return None;
        }
        let value = arguments.get(1);
        let mut constant = self
            .symbol(SymbolKind::Constant, name, &statement)
            .with_type(value.map(|v| literal_type(v, self.source)).unwrap_or_default());
        constant.value = value.map(|v| node_text(v, self.source).to_string());
        Some(constant)
    }

    fn magic_members(&self, doc: &PhpDoc, node: &Node, class: &str) -> Vec<PhpSymbol> {
        let magic = Modifiers {
            is_magic: true,
            ..Modifiers::default()
        };
        let mut members = Vec::new();
        for tag in doc.property_tags() {
            let mut property = self
                .symbol(SymbolKind::Property, tag.name.clone(), node)
                .with_type(self.doc_type(&tag.type_string))
                .with_modifiers(magic)
                .with_scope(class);
            property.description = (!tag.description.is_empty()).then(|| tag.description.clone());
            members.push(property);
        }
        for tag in doc.method_tags() {
            let mut method = self
                .symbol(SymbolKind::Method, tag.name.clone(), node)
                .with_type(self.doc_type(&tag.type_string))
                .with_modifiers(Modifiers {
                    is_static: tag.is_static,
                    ..magic
                })
                .with_scope(class);
            method.description = (!tag.description.is_empty()).then(|| tag.description.clone());
            for param in &tag.parameters {
                let mut ty = self.doc_type(&param.type_string);
                if param.is_variadic {
                    ty = ty.arrayify();
                }
                method = method.with_child(
                    self.symbol(SymbolKind::Parameter, param.name.clone(), node)
                        .with_type(ty)
                        .with_modifiers(Modifiers {
                            is_variadic: param.is_variadic,
                            ..Modifiers::default()
                        }),
                );
            }
            members.push(method);
        }
        members
    }

    /// Top-level closures inside `node`; nested ones belong to their closure.
    fn collect_closures(&self, node: Node) -> Vec<Arc<PhpSymbol>> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            match current.kind() {
                "anonymous_function" | "arrow_function" => {
                    out.push(Arc::new(self.read_callable(current)));
                    continue;
                }
                "class_declaration" | "interface_declaration" | "trait_declaration"
                | "enum_declaration" | "function_definition" | "anonymous_class" => continue,
                _ => {}
            }
            let mut children = named_children(current);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    fn symbol(&self, kind: SymbolKind, name: impl Into<String>, node: &Node) -> PhpSymbol {
        PhpSymbol::new(kind, name)
            .with_range(range_of(node))
            .with_uri(self.uri)
    }

    fn qualify(&self, name: &str) -> String {
        if self.names.namespace().is_empty() {
            name.to_string()
        } else {
            format!("{}\\{}", self.names.namespace(), name)
        }
    }

    fn doc_for(&self, node: &Node) -> Option<PhpDoc> {
        doc_comment_before(node, self.source).and_then(phpdoc::parse)
    }

    fn read_type(&self, node: Option<Node>) -> TypeString {
        node.map(|n| TypeString::parse_declared(node_text(&n, self.source)).name_resolve(&self.names))
            .unwrap_or_default()
    }

    fn doc_type(&self, text: &str) -> TypeString {
        TypeString::parse_lossy(text).name_resolve(&self.names)
    }
}

/// The declared type, or the doc type when nothing is declared or the
/// declaration only says `array`, `iterable` or `mixed`.
fn refine(declared: TypeString, doc: impl FnOnce() -> Option<TypeString>) -> TypeString {
    let generic = declared
        .atoms()
        .all(|atom| matches!(atom, "array" | "iterable" | "mixed" | "null"));
    if !generic {
        return declared;
    }
    match doc() {
        Some(documented) if !documented.is_empty() => {
            if declared.contains("null") {
                documented.union(&TypeString::atom("null"))
            } else {
                documented
            }
        }
        _ => declared,
    }
}

pub fn parameter_name(param: &Node, source: &str) -> Option<String> {
    let name = param.child_by_field_name("name")?;
    let text = node_text(&name, source).trim_start_matches('&').trim();
    (!text.is_empty()).then(|| text.to_string())
}

pub fn read_modifiers(node: Node, source: &str) -> Modifiers {
    let mut modifiers = Modifiers::default();
    for child in named_children(node) {
        match child.kind() {
            "visibility_modifier" => {
                modifiers.visibility = match node_text(&child, source).to_ascii_lowercase().as_str() {
                    "private" => Visibility::Private,
                    "protected" => Visibility::Protected,
                    _ => Visibility::Public,
                }
            }
            "static_modifier" => modifiers.is_static = true,
            "abstract_modifier" => modifiers.is_abstract = true,
            "final_modifier" => modifiers.is_final = true,
            "readonly_modifier" => modifiers.is_readonly = true,
            _ => {}
        }
    }
    modifiers
}

/// Type of a constant initializer when it is a plain literal.
pub fn literal_type(node: &Node, source: &str) -> TypeString {
    match ExprKind::of(node) {
        ExprKind::Integer => TypeString::atom("int"),
        ExprKind::Float => TypeString::atom("float"),
        ExprKind::String => TypeString::atom("string"),
        ExprKind::Boolean => TypeString::atom("bool"),
        ExprKind::Null => TypeString::atom("null"),
        ExprKind::Array => TypeString::atom("array"),
        ExprKind::ConstantName => match node_text(node, source).to_ascii_lowercase().as_str() {
            "true" | "false" => TypeString::atom("bool"),
            "null" => TypeString::atom("null"),
            _ => TypeString::unknown(),
        },
        ExprKind::Unary => node
            .child_by_field_name("argument")
            .map(|arg| literal_type(&arg, source))
            .unwrap_or_default(),
        _ => TypeString::unknown(),
    }
}

fn description(doc: Option<&PhpDoc>) -> Option<String> {
    doc.map(|d| d.text.clone()).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PhpParser;

    fn read(source: &str) -> Vec<Arc<PhpSymbol>> {
        let doc = PhpParser::new().unwrap().parse("file:///t.php", source).unwrap();
        SymbolReader::read_document(&doc)
    }

    fn find<'s>(symbols: &'s [Arc<PhpSymbol>], name: &str) -> &'s Arc<PhpSymbol> {
        symbols.iter().find(|s| s.name == name).unwrap()
    }

    #[test]
    fn reads_class_with_members_and_associations() {
        let symbols = read(
            r#"<?php
namespace App\Models;

use App\Contracts\HasName;

/**
 * A user.
 * @property-read int $age
 * @method static self find(int $id)
 */
class User extends Model implements HasName
{
    use SoftDeletes;

    const TABLE = 'users';

    /** @var string */
    protected $name = 'x';

    public function __construct(private readonly ?Address $address, int ...$ids) {}

    /** @return static */
    public function rename(string $name) { return $this; }
}
"#,
        );
        let namespace = find(&symbols, "App\\Models");
        assert_eq!(namespace.kind, SymbolKind::Namespace);
        let user = find(&namespace.children, "App\\Models\\User");
        assert_eq!(user.base_class(), Some("App\\Models\\Model"));
        assert_eq!(user.interfaces().collect::<Vec<_>>(), vec!["App\\Contracts\\HasName"]);
        assert_eq!(user.traits().collect::<Vec<_>>(), vec!["App\\Models\\SoftDeletes"]);
        assert_eq!(user.description.as_deref(), Some("A user."));

        let name = find(&user.children, "$name");
        assert_eq!(name.type_string.to_string(), "string");
        assert_eq!(name.modifiers.visibility, Visibility::Protected);

        let address = find(&user.children, "$address");
        assert_eq!(address.kind, SymbolKind::Property);
        assert_eq!(address.type_string.to_string(), "App\\Models\\Address|null");
        assert!(address.modifiers.is_readonly);

        let ctor = find(&user.children, "__construct");
        let ids = ctor.parameters().find(|p| p.name == "$ids").unwrap();
        assert_eq!(ids.type_string.to_string(), "int[]");

        assert_eq!(find(&user.children, "rename").type_string.to_string(), "static");
        assert_eq!(find(&user.children, "TABLE").type_string.to_string(), "string");

        let age = find(&user.children, "$age");
        assert!(age.modifiers.is_magic);
        let magic_find = find(&user.children, "find");
        assert!(magic_find.modifiers.is_static);
        assert_eq!(magic_find.type_string.to_string(), "self");
    }

    #[test]
    fn reads_functions_constants_and_closures() {
        let symbols = read(
            r#"<?php
namespace Lib;
const LIMIT = 10;
define('GLOBAL_FLAG', true);
/** @param Widget[] $items */
function first($items) { $f = function (int $x) {}; }
$g = fn(string $s) => $s;
"#,
        );
        let namespace = find(&symbols, "Lib");
        assert_eq!(find(&namespace.children, "Lib\\LIMIT").type_string.to_string(), "int");
        assert_eq!(find(&namespace.children, "GLOBAL_FLAG").type_string.to_string(), "bool");

        let first = find(&namespace.children, "Lib\\first");
        let items = first.parameters().next().unwrap();
        assert_eq!(items.type_string.to_string(), "Lib\\Widget[]");
        let closure = first.children.iter().find(|c| c.name == CLOSURE_NAME).unwrap();
        assert!(closure.modifiers.is_anonymous);
        assert_eq!(closure.parameters().next().unwrap().type_string.to_string(), "int");

        assert!(namespace.children.iter().any(|c| c.name == CLOSURE_NAME));
    }

    #[test]
    fn reads_enum_cases_and_interface_extends() {
        let symbols = read(
            "<?php\ninterface A extends B, C {}\nenum Suit: string { case Hearts = 'H'; }\n",
        );
        let a = find(&symbols, "A");
        assert_eq!(a.interfaces().collect::<Vec<_>>(), vec!["B", "C"]);
        let suit = find(&symbols, "Suit");
        assert_eq!(suit.kind, SymbolKind::Enum);
        assert_eq!(find(&suit.children, "Hearts").type_string.to_string(), "Suit");
    }

    #[test]
    fn doc_types_refine_generic_declarations() {
        let symbols = read(
            r#"<?php
namespace Shop;
class Cart
{
    /** @var Item[] */
    public array $items = [];

    /** @var Item[] */
    public Collection $lines;

    /** @return Item[] */
    public function all(): array {}

    /** @return Item[] */
    public function maybe(): ?array {}

    /** @param Item[] $items */
    public function add(iterable $items, Double $rate): void {}
}
"#,
        );
        let namespace = find(&symbols, "Shop");
        let cart = find(&namespace.children, "Shop\\Cart");
        assert_eq!(find(&cart.children, "$items").type_string.to_string(), "Shop\\Item[]");
        assert_eq!(find(&cart.children, "$lines").type_string.to_string(), "Shop\\Collection");
        assert_eq!(find(&cart.children, "all").type_string.to_string(), "Shop\\Item[]");
        assert_eq!(
            find(&cart.children, "maybe").type_string.to_string(),
            "Shop\\Item[]|null"
        );

        let add = find(&cart.children, "add");
        let mut params = add.parameters();
        assert_eq!(params.next().unwrap().type_string.to_string(), "Shop\\Item[]");
        // `double` is only an alias inside doc comments.
        assert_eq!(params.next().unwrap().type_string.to_string(), "Shop\\Double");
    }
}
