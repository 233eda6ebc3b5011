//! Tag tokenizer and parser.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocError {
    #[error("@{tag}: missing type")]
    MissingType { tag: String },
    #[error("@{tag}: missing variable name")]
    MissingVariable { tag: String },
    #[error("@method: missing method name")]
    MissingMethodName,
    #[error("@method: unterminated parameter list")]
    UnterminatedParameters,
    #[error("@{tag}: unexpected `{text}`")]
    Unexpected { tag: String, text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Param,
    Var,
    Property,
    PropertyRead,
    PropertyWrite,
    Return,
    Method,
}

impl TagKind {
    fn from_name(name: &str) -> Option<Self> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "param" => TagKind::Param,
            "var" => TagKind::Var,
            "property" => TagKind::Property,
            "property-read" => TagKind::PropertyRead,
            "property-write" => TagKind::PropertyWrite,
            "return" => TagKind::Return,
            "method" => TagKind::Method,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_property(&self) -> bool {
        matches!(
            self,
            TagKind::Property | TagKind::PropertyRead | TagKind::PropertyWrite
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodParam {
    pub type_string: String,
    pub name: String,
    pub is_variadic: bool,
}

/// One recognised doc tag. `type_string` is the raw, unresolved type text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub kind: TagKind,
    pub type_string: String,
    /// `$name` for param/var/property tags, the method name for `@method`.
    pub name: String,
    pub description: String,
    pub parameters: Vec<MethodParam>,
    pub is_static: bool,
}

impl Tag {
    fn new(kind: TagKind) -> Self {
        Self {
            kind,
            type_string: String::new(),
            name: String::new(),
            description: String::new(),
            parameters: Vec::new(),
            is_static: false,
        }
    }
}

/// Parses one tag block starting at `@`. Unknown tags yield `Ok(None)`.
pub(crate) fn parse_tag(block: &str) -> Result<Option<Tag>, DocError> {
    let mut cursor = Cursor::new(block);
    let name = cursor.tag_name();
    let Some(kind) = TagKind::from_name(name) else {
        return Ok(None);
    };
    let mut tag = Tag::new(kind);
    match kind {
        TagKind::Param => {
            if let Some(variable) = cursor.variable() {
                tag.name = variable.name;
            } else {
                tag.type_string = cursor.required_type(name)?;
                tag.name = cursor.variable().ok_or_else(|| missing_variable(name))?.name;
            }
        }
        TagKind::Var => {
            if let Some(variable) = cursor.variable() {
                tag.name = variable.name;
                tag.type_string = cursor.required_type(name)?;
            } else {
                tag.type_string = cursor.required_type(name)?;
                if let Some(variable) = cursor.variable() {
                    tag.name = variable.name;
                }
            }
        }
        TagKind::Property | TagKind::PropertyRead | TagKind::PropertyWrite => {
            tag.type_string = cursor.required_type(name)?;
            tag.name = cursor.variable().ok_or_else(|| missing_variable(name))?.name;
        }
        TagKind::Return => {
            tag.type_string = cursor.required_type(name)?;
        }
        TagKind::Method => parse_method(&mut cursor, &mut tag)?,
    }
    tag.description = cursor.rest().trim().to_string();
    Ok(Some(tag))
}

fn missing_variable(tag: &str) -> DocError {
    DocError::MissingVariable {
        tag: tag.to_string(),
    }
}

/// `@method [static] [ReturnType] name(Type $a, $b = 1) description`
fn parse_method(cursor: &mut Cursor, tag: &mut Tag) -> Result<(), DocError> {
    let rest = cursor.rest();
    let open = rest.find('(').ok_or(DocError::MissingMethodName)?;

    let mut head = Cursor::new(&rest[..open]);
    let mut words = Vec::new();
    loop {
        let word = head.type_token();
        if word.is_empty() {
            break;
        }
        words.push(word);
    }
    let name = words.pop().ok_or(DocError::MissingMethodName)?;
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(DocError::MissingMethodName);
    }
    tag.name = name.to_string();
    match words.as_slice() {
        [] => tag.type_string = "void".to_string(),
        [ty] => tag.type_string = ty.to_string(),
        [modifier, ty] if modifier.eq_ignore_ascii_case("static") => {
            tag.is_static = true;
            tag.type_string = ty.to_string();
        }
        _ => {
            return Err(DocError::Unexpected {
                tag: "method".to_string(),
                text: words.join(" "),
            });
        }
    }

    cursor.advance(open + 1);
    let close = matching_paren(cursor.rest()).ok_or(DocError::UnterminatedParameters)?;
    let params = &cursor.rest()[..close];
    for raw in split_top_level_commas(params) {
        if raw.trim().is_empty() {
            continue;
        }
        let mut param = Cursor::new(raw);
        let (type_string, variable) = match param.variable() {
            Some(variable) => (String::new(), variable),
            None => {
                let ty = param.type_token().to_string();
                let variable = param.variable().ok_or_else(|| missing_variable("method"))?;
                (ty, variable)
            }
        };
        tag.parameters.push(MethodParam {
            type_string,
            name: variable.name,
            is_variadic: variable.is_variadic,
        });
    }
    cursor.advance(close + 1);

    // Optional `: ReturnType` after the parameter list.
    if cursor.peek() == Some(':') {
        cursor.advance(1);
        let ty = cursor.type_token();
        if !ty.is_empty() && (tag.type_string == "void" || tag.type_string.is_empty()) {
            tag.type_string = ty.to_string();
        }
    }
    Ok(())
}

fn matching_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

fn split_top_level_commas(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '<' | '[' | '{' => depth += 1,
            ')' | '>' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

struct Variable {
    name: String,
    is_variadic: bool,
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn advance(&mut self, bytes: usize) {
        self.pos = (self.pos + bytes).min(self.input.len());
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.rest().chars().next()
    }

    fn tag_name(&mut self) -> &'a str {
        self.skip_whitespace();
        if self.rest().starts_with('@') {
            self.advance(1);
        }
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(rest.len());
        self.advance(len);
        &rest[..len]
    }

    /// A whitespace-delimited type, keeping whitespace inside brackets.
    fn type_token(&mut self) -> &'a str {
        self.skip_whitespace();
        let rest = self.rest();
        let mut depth = 0i32;
        let mut end = rest.len();
        for (i, c) in rest.char_indices() {
            match c {
                '<' | '(' | '{' | '[' => depth += 1,
                '>' | ')' | '}' | ']' => depth -= 1,
                c if c.is_whitespace() && depth <= 0 => {
                    end = i;
                    break;
                }
                _ => {}
            }
        }
        self.advance(end);
        &rest[..end]
    }

    fn required_type(&mut self, tag: &str) -> Result<String, DocError> {
        match self.peek() {
            None | Some('$') => Err(DocError::MissingType {
                tag: tag.to_string(),
            }),
            Some(_) => Ok(self.type_token().to_string()),
        }
    }

    /// `$name`, `&$name` or `...$name`; consumes nothing when absent.
    fn variable(&mut self) -> Option<Variable> {
        self.skip_whitespace();
        let rest = self.rest();
        let mut offset = 0;
        if rest[offset..].starts_with('&') {
            offset += 1;
        }
        let is_variadic = rest[offset..].starts_with("...");
        if is_variadic {
            offset += 3;
        }
        if !rest[offset..].starts_with('$') {
            return None;
        }
        let ident = &rest[offset + 1..];
        let len = ident
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || !c.is_ascii()))
            .unwrap_or(ident.len());
        if len == 0 {
            return None;
        }
        self.advance(offset + 1 + len);
        Some(Variable {
            name: format!("${}", &ident[..len]),
            is_variadic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(text: &str) -> Tag {
        parse_tag(text).unwrap().unwrap()
    }

    #[test]
    fn param_with_generic_type() {
        let t = tag("@param array<int, Foo> $items the items");
        assert_eq!(t.kind, TagKind::Param);
        assert_eq!(t.type_string, "array<int, Foo>");
        assert_eq!(t.name, "$items");
        assert_eq!(t.description, "the items");
    }

    #[test]
    fn var_accepts_either_order_and_optional_name() {
        let t = tag("@var Foo|null");
        assert_eq!((t.type_string.as_str(), t.name.as_str()), ("Foo|null", ""));
        let t = tag("@var $x Foo");
        assert_eq!((t.type_string.as_str(), t.name.as_str()), ("Foo", "$x"));
    }

    #[test]
    fn method_tag_with_static_modifier_and_params() {
        let t = tag("@method static Builder where(string $column, mixed ...$values) Adds a clause");
        assert!(t.is_static);
        assert_eq!(t.type_string, "Builder");
        assert_eq!(t.name, "where");
        assert_eq!(t.parameters.len(), 2);
        assert_eq!(t.parameters[1].name, "$values");
        assert!(t.parameters[1].is_variadic);
        assert_eq!(t.description, "Adds a clause");
    }

    #[test]
    fn method_tag_without_return_type() {
        let t = tag("@method reset()");
        assert_eq!(t.type_string, "void");
        assert_eq!(t.name, "reset");
        assert!(!t.is_static);
    }

    #[test]
    fn malformed_tags_are_errors() {
        assert_eq!(
            parse_tag("@property Foo"),
            Err(DocError::MissingVariable {
                tag: "property".to_string()
            })
        );
        assert!(matches!(parse_tag("@return"), Err(DocError::MissingType { .. })));
        assert_eq!(
            parse_tag("@method Foo bar(int $x"),
            Err(DocError::UnterminatedParameters)
        );
        assert_eq!(parse_tag("@deprecated use bar"), Ok(None));
    }
}
