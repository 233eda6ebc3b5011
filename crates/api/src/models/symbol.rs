use super::types::TypeString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Range {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl Range {
    pub fn contains_offset(&self, offset: usize) -> bool {
        offset >= self.start_byte && offset <= self.end_byte
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Namespace,
    Class,
    Interface,
    Trait,
    Enum,
    Function,
    Method,
    Property,
    Constant,
    ClassConstant,
    Variable,
    Parameter,
}

impl SymbolKind {
    pub fn is_class_like(&self) -> bool {
        matches!(
            self,
            SymbolKind::Class | SymbolKind::Interface | SymbolKind::Trait | SymbolKind::Enum
        )
    }

    pub fn is_member(&self) -> bool {
        matches!(
            self,
            SymbolKind::Method | SymbolKind::Property | SymbolKind::ClassConstant
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    pub is_readonly: bool,
    /// Declared through a `@property` or `@method` doc tag.
    pub is_magic: bool,
    pub is_variadic: bool,
    /// Closures and arrow functions.
    pub is_anonymous: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AssociationKind {
    Extends,
    Implements,
    Uses,
}

/// A type related to a class-like declaration, in declared order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Association {
    pub kind: AssociationKind,
    pub name: String,
}

/// A declaration record.
///
/// Class-like, function and constant records carry their fully-qualified
/// name. Members carry their simple name (properties keep the leading `$`)
/// and the fully-qualified name of the declaring class in `scope`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PhpSymbol {
    pub kind: SymbolKind,
    pub name: String,
    pub type_string: TypeString,
    pub modifiers: Modifiers,
    pub scope: Option<String>,
    pub associated: Vec<Association>,
    pub children: Vec<Arc<PhpSymbol>>,
    pub range: Range,
    pub uri: String,
    pub description: Option<String>,
    pub value: Option<String>,
}

impl PhpSymbol {
    pub fn new(kind: SymbolKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            type_string: TypeString::default(),
            modifiers: Modifiers::default(),
            scope: None,
            associated: Vec::new(),
            children: Vec::new(),
            range: Range::default(),
            uri: String::new(),
            description: None,
            value: None,
        }
    }

    pub fn with_type(mut self, type_string: TypeString) -> Self {
        self.type_string = type_string;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_association(mut self, kind: AssociationKind, name: impl Into<String>) -> Self {
        self.associated.push(Association {
            kind,
            name: name.into(),
        });
        self
    }

    pub fn with_child(mut self, child: PhpSymbol) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    pub fn with_range(mut self, range: Range) -> Self {
        self.range = range;
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    /// Last segment of a namespaced name.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('\\').next().unwrap_or(&self.name)
    }

    pub fn is_class_like(&self) -> bool {
        self.kind.is_class_like()
    }

    /// The parent class of a class. Interfaces report their extended
    /// interfaces through [`PhpSymbol::interfaces`] instead.
    pub fn base_class(&self) -> Option<&str> {
        if self.kind != SymbolKind::Class {
            return None;
        }
        self.associations(AssociationKind::Extends).next()
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &str> {
        let extends_interfaces = self.kind == SymbolKind::Interface;
        self.associated
            .iter()
            .filter(move |a| {
                a.kind == AssociationKind::Implements
                    || (extends_interfaces && a.kind == AssociationKind::Extends)
            })
            .map(|a| a.name.as_str())
    }

    pub fn traits(&self) -> impl Iterator<Item = &str> {
        self.associations(AssociationKind::Uses)
    }

    pub fn members(&self) -> impl Iterator<Item = &Arc<PhpSymbol>> {
        self.children.iter().filter(|c| c.kind.is_member())
    }

    pub fn parameters(&self) -> impl Iterator<Item = &Arc<PhpSymbol>> {
        self.children
            .iter()
            .filter(|c| c.kind == SymbolKind::Parameter)
    }

    /// Method names compare case-insensitively, properties and constants exactly.
    pub fn matches_member(&self, kind: SymbolKind, name: &str) -> bool {
        self.kind == kind
            && match kind {
                SymbolKind::Method => self.name.eq_ignore_ascii_case(name),
                _ => self.name == name,
            }
    }

    fn associations(&self, kind: AssociationKind) -> impl Iterator<Item = &str> {
        self.associated
            .iter()
            .filter(move |a| a.kind == kind)
            .map(|a| a.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_extends_are_reported_as_interfaces() {
        let iface = PhpSymbol::new(SymbolKind::Interface, "App\\Countable")
            .with_association(AssociationKind::Extends, "App\\Sized")
            .with_association(AssociationKind::Extends, "App\\Empty");
        assert_eq!(iface.base_class(), None);
        assert_eq!(
            iface.interfaces().collect::<Vec<_>>(),
            vec!["App\\Sized", "App\\Empty"]
        );
    }

    #[test]
    fn method_names_match_case_insensitively() {
        let method = PhpSymbol::new(SymbolKind::Method, "getName");
        assert!(method.matches_member(SymbolKind::Method, "GETNAME"));
        let prop = PhpSymbol::new(SymbolKind::Property, "$name");
        assert!(!prop.matches_member(SymbolKind::Property, "$Name"));
        assert_eq!(
            PhpSymbol::new(SymbolKind::Class, "App\\Models\\User").short_name(),
            "User"
        );
    }
}
