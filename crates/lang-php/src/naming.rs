//! Name resolution.
//!
//! Turns the names written in source into fully-qualified names (without a
//! leading `\`) using the current namespace and the `use` imports in effect.

use crate::parser::ast::{children, named_children, node_text};
use phpscope_api::models::types::{ClassNameResolver, is_reserved_type};
use tree_sitter::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    Class,
    Function,
    Constant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRule {
    pub kind: ImportKind,
    /// Fully-qualified imported name.
    pub name: String,
    pub alias: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameStyle {
    Unqualified,
    Qualified,
    FullyQualified,
    Relative,
}

impl NameStyle {
    pub fn of(name: &str) -> Self {
        if name.starts_with('\\') {
            NameStyle::FullyQualified
        } else if name
            .get(..10)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("namespace\\"))
        {
            NameStyle::Relative
        } else if name.contains('\\') {
            NameStyle::Qualified
        } else {
            NameStyle::Unqualified
        }
    }
}

/// Namespace plus import table at one point of a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameResolver {
    namespace: String,
    imports: Vec<ImportRule>,
}

impl NameResolver {
    pub fn new(namespace: impl Into<String>, imports: Vec<ImportRule>) -> Self {
        Self {
            namespace: namespace.into(),
            imports,
        }
    }

    /// The resolver in effect at `offset`: the enclosing or preceding
    /// namespace, and the imports declared before `offset` in that namespace.
    pub fn at_offset(root: Node, source: &str, offset: usize) -> Self {
        let mut resolver = Self::default();
        resolver.scan_statements(root, source, offset);
        resolver
    }

    fn scan_statements(&mut self, container: Node, source: &str, offset: usize) {
        for statement in named_children(container) {
            if statement.start_byte() >= offset {
                break;
            }
            match statement.kind() {
                "namespace_definition" => {
                    let name = statement
                        .child_by_field_name("name")
                        .map(|n| node_text(&n, source))
                        .unwrap_or("");
                    match statement.child_by_field_name("body") {
                        Some(body) => {
                            if offset < statement.end_byte() {
                                *self = Self::new(name, Vec::new());
                                self.scan_statements(body, source, offset);
                                return;
                            }
                            // A closed braced namespace leaves the global scope.
                            *self = Self::default();
                        }
                        None => *self = Self::new(name, Vec::new()),
                    }
                }
                "namespace_use_declaration" => {
                    self.imports.extend(read_use_declaration(statement, source));
                }
                _ => {}
            }
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn imports(&self) -> &[ImportRule] {
        &self.imports
    }

    pub fn set_namespace(&mut self, namespace: impl Into<String>) {
        self.namespace = namespace.into();
        self.imports.clear();
    }

    pub fn add_imports(&mut self, imports: impl IntoIterator<Item = ImportRule>) {
        self.imports.extend(imports);
    }

    /// Resolves a class, interface or trait name.
    pub fn resolve_class(&self, name: &str) -> String {
        if is_reserved_type(name) {
            return name.to_string();
        }
        self.resolve_candidates(name, ImportKind::Class)
            .into_iter()
            .next()
            .unwrap_or_default()
    }

    /// Candidate fully-qualified names, most specific first. Only unqualified
    /// function and constant names have a global fallback.
    pub fn resolve_candidates(&self, name: &str, kind: ImportKind) -> Vec<String> {
        let name = name.trim();
        match NameStyle::of(name) {
            NameStyle::FullyQualified => vec![name.trim_start_matches('\\').to_string()],
            NameStyle::Relative => vec![self.concat(&name[10..])],
            NameStyle::Qualified => {
                let (first, remainder) = name.split_once('\\').unwrap_or((name, ""));
                match self.find_import(first, ImportKind::Class) {
                    Some(rule) => vec![format!("{}\\{}", rule.name, remainder)],
                    None => vec![self.concat(name)],
                }
            }
            NameStyle::Unqualified => {
                if let Some(rule) = self.find_import(name, kind) {
                    return vec![rule.name.clone()];
                }
                match kind {
                    ImportKind::Class => vec![self.concat(name)],
                    ImportKind::Function | ImportKind::Constant => {
                        if self.namespace.is_empty() {
                            vec![name.to_string()]
                        } else {
                            vec![self.concat(name), name.to_string()]
                        }
                    }
                }
            }
        }
    }

    fn find_import(&self, alias: &str, kind: ImportKind) -> Option<&ImportRule> {
        self.imports.iter().find(|rule| {
            rule.kind == kind
                && match kind {
                    // Constant aliases are case-sensitive.
                    ImportKind::Constant => rule.alias == alias,
                    _ => rule.alias.eq_ignore_ascii_case(alias),
                }
        })
    }

    fn concat(&self, name: &str) -> String {
        if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}\\{}", self.namespace, name)
        }
    }
}

impl ClassNameResolver for NameResolver {
    fn resolve_class_name(&self, name: &str) -> String {
        self.resolve_class(name)
    }
}

/// Import rules declared by one `use` statement, including group uses.
pub fn read_use_declaration(node: Node, source: &str) -> Vec<ImportRule> {
    let declared_kind = keyword_kind(node).unwrap_or(ImportKind::Class);
    let prefix = named_children(node)
        .into_iter()
        .find(|n| n.kind() == "namespace_name")
        .map(|n| format!("{}\\", node_text(&n, source).trim_start_matches('\\')))
        .unwrap_or_default();

    let clauses = match node.child_by_field_name("body") {
        Some(group) => named_children(group),
        None => named_children(node),
    };

    clauses
        .into_iter()
        .filter(|clause| clause.kind() == "namespace_use_clause")
        .filter_map(|clause| {
            let kind = keyword_kind(clause).unwrap_or(declared_kind);
            let name_node = named_children(clause)
                .into_iter()
                .find(|n| matches!(n.kind(), "name" | "qualified_name"))?;
            let name = format!(
                "{}{}",
                prefix,
                node_text(&name_node, source).trim_start_matches('\\')
            );
            let alias = clause
                .child_by_field_name("alias")
                .map(|a| node_text(&a, source).to_string())
                .unwrap_or_else(|| name.rsplit('\\').next().unwrap_or(&name).to_string());
            Some(ImportRule { kind, name, alias })
        })
        .collect()
}

fn keyword_kind(node: Node) -> Option<ImportKind> {
    children(node).into_iter().find_map(|child| match child.kind() {
        "function" => Some(ImportKind::Function),
        "const" => Some(ImportKind::Constant),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PhpParser;

    fn class_import(name: &str, alias: &str) -> ImportRule {
        ImportRule {
            kind: ImportKind::Class,
            name: name.to_string(),
            alias: alias.to_string(),
        }
    }

    #[test]
    fn resolves_aliases_namespace_and_fully_qualified_names() {
        let resolver = NameResolver::new(
            "App\\Models",
            vec![class_import("App\\Services\\Logger", "Log")],
        );
        assert_eq!(resolver.resolve_class("Log"), "App\\Services\\Logger");
        assert_eq!(resolver.resolve_class("log"), "App\\Services\\Logger");
        assert_eq!(resolver.resolve_class("Helper"), "App\\Models\\Helper");
        assert_eq!(resolver.resolve_class("\\Foo\\Bar"), "Foo\\Bar");
        assert_eq!(resolver.resolve_class("Log\\Handler"), "App\\Services\\Logger\\Handler");
        assert_eq!(resolver.resolve_class("Sub\\Thing"), "App\\Models\\Sub\\Thing");
        assert_eq!(resolver.resolve_class("namespace\\Thing"), "App\\Models\\Thing");
        assert_eq!(resolver.resolve_class("self"), "self");
        assert_eq!(resolver.resolve_class("int"), "int");
        assert_eq!(resolver.resolve_class("Double"), "App\\Models\\Double");
        assert_eq!(resolver.resolve_class("Integer"), "App\\Models\\Integer");
    }

    #[test]
    fn functions_fall_back_to_global_name() {
        let resolver = NameResolver::new("App", Vec::new());
        assert_eq!(
            resolver.resolve_candidates("strlen", ImportKind::Function),
            vec!["App\\strlen".to_string(), "strlen".to_string()]
        );
        assert_eq!(
            NameResolver::default().resolve_candidates("strlen", ImportKind::Function),
            vec!["strlen".to_string()]
        );
    }

    #[test]
    fn reads_imports_preceding_offset() {
        let source = "<?php\nnamespace App;\nuse Lib\\{Alpha, Beta as B};\nuse function Lib\\helper;\nuse const Lib\\LIMIT;\n$x = 1;\nuse Lib\\Late;\n";
        let doc = PhpParser::new().unwrap().parse("file:///a.php", source).unwrap();
        let offset = source.find("$x").unwrap();
        let resolver = NameResolver::at_offset(doc.root_node(), source, offset);

        assert_eq!(resolver.namespace(), "App");
        assert_eq!(resolver.resolve_class("Alpha"), "Lib\\Alpha");
        assert_eq!(resolver.resolve_class("B"), "Lib\\Beta");
        assert_eq!(resolver.resolve_class("Late"), "App\\Late");
        assert_eq!(
            resolver.resolve_candidates("helper", ImportKind::Function),
            vec!["Lib\\helper".to_string()]
        );
        assert_eq!(
            resolver.resolve_candidates("LIMIT", ImportKind::Constant),
            vec!["Lib\\LIMIT".to_string()]
        );
    }

    #[test]
    fn braced_namespaces_scope_their_imports() {
        let source = "<?php\nnamespace A { use X\\Y; }\nnamespace B { $here = 1; }\n";
        let doc = PhpParser::new().unwrap().parse("file:///a.php", source).unwrap();
        let offset = source.find("$here").unwrap();
        let resolver = NameResolver::at_offset(doc.root_node(), source, offset);
        assert_eq!(resolver.namespace(), "B");
        assert_eq!(resolver.resolve_class("Y"), "B\\Y");
    }
}
