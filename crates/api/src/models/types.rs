//! Type descriptors.
//!
//! A [`TypeString`] is a normalized, order-independent set of type atoms:
//! class names, scalar keywords, `array`, `callable`, `null`, `mixed`, the
//! self-reference markers `self`/`static`/`$this` and typed arrays `T[]`.
//! The empty set means "unknown". `mixed` absorbs every other atom.
//!
//! The textual form is the canonical pipe-delimited list of atoms in sorted
//! order, which is also the serde representation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

const MIXED: &str = "mixed";
const NULL: &str = "null";
const ARRAY: &str = "array";

/// Rewrites a relative class name into its fully-qualified form.
pub trait ClassNameResolver {
    fn resolve_class_name(&self, name: &str) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeStringError {
    #[error("unexpected end of type string `{input}`")]
    UnexpectedEnd { input: String },
    #[error("unexpected `{found}` at byte {position} in type string `{input}`")]
    UnexpectedToken {
        input: String,
        found: char,
        position: usize,
    },
}

/// A possibly-union type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TypeString {
    atoms: BTreeSet<String>,
}

impl TypeString {
    /// The unknown type.
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn mixed() -> Self {
        Self::atom(MIXED)
    }

    /// A single-atom type. Reserved keywords are lowercased, class names keep
    /// their spelling.
    pub fn atom(name: &str) -> Self {
        let mut ty = Self::default();
        ty.insert(canonical_atom(name));
        ty
    }

    /// A single atom read from doc-comment text, where aliases such as
    /// `integer` or `list` stand for their keyword.
    fn doc_atom(name: &str) -> Self {
        let mut ty = Self::default();
        ty.insert(normalize_atom(name));
        ty
    }

    /// Parses leniently: malformed alternatives are dropped instead of failing
    /// the whole string.
    pub fn parse_lossy(text: &str) -> Self {
        if let Ok(ty) = text.parse::<TypeString>() {
            return ty;
        }
        split_top_level(text)
            .into_iter()
            .filter_map(|part| part.parse::<TypeString>().ok())
            .fold(Self::default(), |acc, ty| acc.union(&ty))
    }

    /// Reads a native type declaration (`?Foo`, `A|B`, `(A&B)|null`). Names
    /// are taken as written, so `Double` stays a class name.
    pub fn parse_declared(text: &str) -> Self {
        let mut ty = Self::default();
        let text = text.trim();
        if let Some(inner) = text.strip_prefix('?') {
            ty.insert(NULL.to_string());
            ty.union_with(&Self::parse_declared(inner));
            return ty;
        }
        for part in text.split(['|', '&', '(', ')']) {
            let part = part.trim();
            if !part.is_empty() {
                ty.insert(canonical_atom(part));
            }
        }
        ty
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn is_mixed(&self) -> bool {
        self.atoms.contains(MIXED)
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn contains(&self, atom: &str) -> bool {
        self.atoms.contains(&canonical_atom(atom))
    }

    pub fn atoms(&self) -> impl Iterator<Item = &str> {
        self.atoms.iter().map(String::as_str)
    }

    pub fn union(&self, other: &TypeString) -> TypeString {
        let mut merged = self.clone();
        merged.union_with(other);
        merged
    }

    pub fn union_with(&mut self, other: &TypeString) {
        for atom in &other.atoms {
            self.insert(atom.clone());
        }
    }

    /// Whether `name` appears as a class atom, compared case-insensitively and
    /// ignoring a leading separator.
    pub fn has_class_type(&self, name: &str) -> bool {
        let wanted = name.trim_start_matches('\\');
        self.class_types()
            .any(|atom| atom.trim_start_matches('\\').eq_ignore_ascii_case(wanted))
    }

    /// Class-name atoms, excluding keywords and typed arrays.
    pub fn class_types(&self) -> impl Iterator<Item = &str> {
        self.atoms()
            .filter(|atom| !atom.ends_with("[]") && !is_reserved_type(atom))
    }

    /// The element type of an indexed access on a value of this type.
    pub fn array_dereference(&self) -> TypeString {
        if self.is_mixed() {
            return Self::mixed();
        }
        let mut element = Self::default();
        for atom in &self.atoms {
            if let Some(base) = atom.strip_suffix("[]") {
                element.insert(base.to_string());
            }
        }
        element
    }

    pub fn arrayify(&self) -> TypeString {
        let mut array = Self::default();
        for atom in &self.atoms {
            array.insert(format!("{atom}[]"));
        }
        array
    }

    /// Rewrites relative class atoms into fully-qualified names.
    pub fn name_resolve(&self, resolver: &dyn ClassNameResolver) -> TypeString {
        self.map_bases(|base| {
            if is_reserved_type(base) {
                base.to_string()
            } else if let Some(qualified) = base.strip_prefix('\\') {
                qualified.to_string()
            } else {
                resolver.resolve_class_name(base)
            }
        })
    }

    /// Replaces `self` with `self_class` and `static`/`$this` with `static_class`.
    /// An empty class name leaves the marker in place.
    pub fn resolve_self(&self, self_class: &str, static_class: &str) -> TypeString {
        self.map_bases(|base| match base {
            "self" if !self_class.is_empty() => self_class.to_string(),
            "static" | "$this" if !static_class.is_empty() => static_class.to_string(),
            _ => base.to_string(),
        })
    }

    pub fn without_null(&self) -> TypeString {
        let mut ty = self.clone();
        ty.atoms.remove(NULL);
        ty
    }

    fn map_bases(&self, mut f: impl FnMut(&str) -> String) -> TypeString {
        let mut mapped = Self::default();
        for atom in &self.atoms {
            let base = atom.trim_end_matches("[]");
            let dims = &atom[base.len()..];
            mapped.insert(format!("{}{}", f(base), dims));
        }
        mapped
    }

    fn insert(&mut self, atom: String) {
        if atom.is_empty() || self.is_mixed() {
            return;
        }
        if atom == MIXED {
            self.atoms.clear();
        }
        self.atoms.insert(atom);
    }
}

impl fmt::Display for TypeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, atom) in self.atoms.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            f.write_str(atom)?;
        }
        Ok(())
    }
}

impl FromStr for TypeString {
    type Err = TypeStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser { input: s, pos: 0 };
        if parser.peek().is_none() {
            return Ok(Self::default());
        }
        let ty = parser.union()?;
        match parser.peek() {
            None => Ok(ty),
            Some(_) => Err(parser.error()),
        }
    }
}

impl From<TypeString> for String {
    fn from(ty: TypeString) -> Self {
        ty.to_string()
    }
}

impl TryFrom<String> for TypeString {
    type Error = TypeStringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Whether `name` is a reserved type keyword, which can never name a class.
/// Doc-only aliases such as `double` or `list` are not reserved.
pub fn is_reserved_type(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "int"
            | "bool"
            | "float"
            | "string"
            | "array"
            | "callable"
            | "false"
            | "true"
            | "iterable"
            | "mixed"
            | "never"
            | "null"
            | "object"
            | "resource"
            | "void"
            | "self"
            | "static"
            | "$this"
            | "parent"
    )
}

fn keyword(lower: &str) -> Option<&'static str> {
    let canonical = match lower {
        "int" | "integer" | "positive-int" | "negative-int" | "non-negative-int"
        | "non-positive-int" => "int",
        "bool" | "boolean" => "bool",
        "float" | "double" => "float",
        "string" | "non-empty-string" | "class-string" | "numeric-string"
        | "callable-string" | "literal-string" => "string",
        "array" | "non-empty-array" | "list" | "non-empty-list" => ARRAY,
        "callable" => "callable",
        "false" => "false",
        "true" => "true",
        "iterable" => "iterable",
        "mixed" => MIXED,
        "never" => "never",
        "null" => NULL,
        "object" => "object",
        "resource" => "resource",
        "void" => "void",
        "self" => "self",
        "static" => "static",
        "$this" => "$this",
        "parent" => "parent",
        _ => return None,
    };
    Some(canonical)
}

fn canonical_atom(raw: &str) -> String {
    let raw = raw.trim();
    if is_reserved_type(raw.trim_end_matches("[]")) {
        raw.to_ascii_lowercase()
    } else {
        raw.to_string()
    }
}

fn normalize_atom(raw: &str) -> String {
    let raw = raw.trim();
    let base = raw.trim_end_matches("[]");
    let dims = &raw[base.len()..];
    match keyword(&base.to_ascii_lowercase()) {
        Some(canonical) => format!("{canonical}{dims}"),
        None => raw.to_string(),
    }
}

fn is_collection(lower: &str) -> bool {
    matches!(
        lower,
        "array" | "list" | "iterable" | "non-empty-array" | "non-empty-list"
    )
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '\\' || c == '$' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '\\' | '$' | '-') || !c.is_ascii()
}

/// Splits on `|` outside of brackets.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '<' | '{' | '[' => depth += 1,
            ')' | '>' | '}' | ']' => depth -= 1,
            '|' if depth <= 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), TypeStringError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn error(&mut self) -> TypeStringError {
        match self.peek() {
            Some(found) => TypeStringError::UnexpectedToken {
                input: self.input.to_string(),
                found,
                position: self.pos,
            },
            None => TypeStringError::UnexpectedEnd {
                input: self.input.to_string(),
            },
        }
    }

    fn union(&mut self) -> Result<TypeString, TypeStringError> {
        let mut ty = self.term()?;
        while matches!(self.peek(), Some('|') | Some('&')) {
            self.bump();
            let next = self.term()?;
            ty.union_with(&next);
        }
        Ok(ty)
    }

    fn term(&mut self) -> Result<TypeString, TypeStringError> {
        let ty = match self.peek() {
            Some('?') => {
                self.bump();
                return Ok(self.term()?.union(&TypeString::atom(NULL)));
            }
            Some('(') => {
                self.bump();
                let inner = self.union()?;
                self.expect(')')?;
                inner
            }
            Some(c) if is_ident_start(c) => self.named()?,
            _ => return Err(self.error()),
        };
        self.array_suffix(ty)
    }

    fn array_suffix(&mut self, mut ty: TypeString) -> Result<TypeString, TypeStringError> {
        while self.peek() == Some('[') {
            self.bump();
            self.expect(']')?;
            ty = ty.arrayify();
        }
        Ok(ty)
    }

    fn ident(&mut self) -> &'a str {
        self.skip_whitespace();
        let rest = &self.input[self.pos..];
        let len = rest
            .char_indices()
            .find(|(_, c)| !is_ident_char(*c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn named(&mut self) -> Result<TypeString, TypeStringError> {
        let name = self.ident();
        let lower = name.to_ascii_lowercase();
        match self.peek() {
            Some('<') => {
                self.bump();
                let mut args = vec![self.union()?];
                while self.eat(',') {
                    args.push(self.union()?);
                }
                self.expect('>')?;
                if !is_collection(&lower) {
                    return Ok(TypeString::doc_atom(name));
                }
                match args.pop() {
                    Some(value) if !value.is_empty() => Ok(value.arrayify()),
                    _ => Ok(TypeString::atom(ARRAY)),
                }
            }
            Some('{') if matches!(lower.as_str(), "array" | "list" | "object") => {
                self.skip_balanced('{', '}')?;
                Ok(TypeString::doc_atom(name))
            }
            Some('(') if matches!(lower.trim_start_matches('\\'), "callable" | "closure") => {
                self.skip_balanced('(', ')')?;
                if self.eat(':') {
                    self.term()?;
                }
                Ok(TypeString::doc_atom(name))
            }
            _ => Ok(TypeString::doc_atom(name)),
        }
    }

    fn skip_balanced(&mut self, open: char, close: char) -> Result<(), TypeStringError> {
        let mut depth = 0usize;
        while let Some(c) = self.input[self.pos..].chars().next() {
            self.pos += c.len_utf8();
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
        }
        Err(TypeStringError::UnexpectedEnd {
            input: self.input.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Prefixing(&'static str);

    impl ClassNameResolver for Prefixing {
        fn resolve_class_name(&self, name: &str) -> String {
            format!("{}\\{}", self.0, name)
        }
    }

    fn ty(s: &str) -> TypeString {
        s.parse().unwrap()
    }

    #[test]
    fn union_is_commutative_and_idempotent() {
        let samples = ["int", "string|null", "Foo[]", "mixed", "", "Bar|int"];
        for a in samples {
            for b in samples {
                assert_eq!(ty(a).union(&ty(b)), ty(b).union(&ty(a)), "{a} / {b}");
            }
            assert_eq!(ty(a).union(&ty(a)), ty(a));
        }
    }

    #[test]
    fn display_is_canonical_and_round_trips() {
        let t = ty("string|Foo|int|Foo");
        assert_eq!(t.to_string(), "Foo|int|string");
        assert_eq!(ty(&t.to_string()), t);

        let nested = ty("(App\\A|null)[][]|bool");
        assert_eq!(ty(&nested.to_string()), nested);
    }

    #[test]
    fn nullable_and_aliases_normalize() {
        assert_eq!(ty("?Foo"), ty("Foo|null"));
        assert_eq!(ty("INTEGER|Boolean|double"), ty("int|bool|float"));
        assert_eq!(ty("NULL").to_string(), "null");
    }

    #[test]
    fn declared_types_keep_alias_spelled_classes() {
        let declared = TypeString::parse_declared("?Double");
        assert_eq!(declared.to_string(), "Double|null");
        assert_eq!(declared.class_types().collect::<Vec<_>>(), vec!["Double"]);
        assert_eq!(TypeString::parse_declared("(A&B)|INT").to_string(), "A|B|int");
        assert_eq!(TypeString::atom("Integer").to_string(), "Integer");
        assert_eq!(TypeString::atom("Self").to_string(), "self");
    }

    #[test]
    fn generic_collections_become_typed_arrays() {
        assert_eq!(ty("array<int, Widget>"), ty("Widget[]"));
        assert_eq!(ty("list<Widget>"), ty("Widget[]"));
        assert_eq!(ty("iterable<string, ?Foo>"), ty("Foo[]|null[]"));
        assert_eq!(ty("Collection<Widget>"), ty("Collection"));
        assert_eq!(ty("array{id: int, name: string}"), ty("array"));
    }

    #[test]
    fn mixed_absorbs_everything() {
        let t = ty("int").union(&TypeString::mixed());
        assert_eq!(t.to_string(), "mixed");
        assert_eq!(t.union(&ty("Foo")), TypeString::mixed());
    }

    #[test]
    fn array_dereference_keeps_only_element_types() {
        assert_eq!(ty("Widget[]|int").array_dereference(), ty("Widget"));
        assert_eq!(ty("Foo[][]").array_dereference(), ty("Foo[]"));
        assert_eq!(TypeString::mixed().array_dereference(), TypeString::mixed());
        assert!(ty("array|string").array_dereference().is_empty());
    }

    #[test]
    fn name_resolve_skips_keywords_and_strips_leading_separator() {
        let resolved = ty("Foo[]|\\Bar\\Baz|int|static").name_resolve(&Prefixing("App"));
        assert_eq!(resolved, ty("App\\Foo[]|Bar\\Baz|int|static"));
    }

    #[test]
    fn resolve_self_substitutes_markers() {
        let t = ty("self|static[]|$this|int");
        assert_eq!(
            t.resolve_self("App\\Base", "App\\Child"),
            ty("App\\Base|App\\Child[]|App\\Child|int")
        );
        assert_eq!(t.resolve_self("", ""), t);
    }

    #[test]
    fn class_types_and_has_class_type() {
        let t = ty("App\\Foo|int|Bar[]|null");
        assert_eq!(t.class_types().collect::<Vec<_>>(), vec!["App\\Foo"]);
        assert!(t.has_class_type("\\app\\foo"));
        assert!(!t.has_class_type("Bar"));
    }

    #[test]
    fn strict_parse_rejects_malformed_text() {
        assert!("Foo|".parse::<TypeString>().is_err());
        assert!("array<int".parse::<TypeString>().is_err());
        assert!("Foo Bar".parse::<TypeString>().is_err());
        assert!("".parse::<TypeString>().unwrap().is_empty());
    }

    #[test]
    fn lossy_parse_keeps_valid_alternatives() {
        assert_eq!(TypeString::parse_lossy("Foo|'literal'|int"), ty("Foo|int"));
        assert!(TypeString::parse_lossy("%%").is_empty());
    }

    #[test]
    fn serde_uses_string_form() {
        let json = serde_json::to_string(&ty("int|Foo")).unwrap();
        assert_eq!(json, "\"Foo|int\"");
        let back: TypeString = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ty("Foo|int"));
    }
}
