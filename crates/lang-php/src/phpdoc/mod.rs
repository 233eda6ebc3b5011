//! Doc comment parsing.
//!
//! Only the tags that carry type information are recognised: `@param`,
//! `@var`, `@property` (and its `-read`/`-write` forms), `@return` and
//! `@method`. Malformed tags are logged and dropped; the rest of the comment
//! is still returned.

mod tag;

pub use tag::{DocError, MethodParam, Tag, TagKind};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhpDoc {
    /// Free text before the first tag.
    pub text: String,
    pub tags: Vec<Tag>,
}

impl PhpDoc {
    pub fn return_tag(&self) -> Option<&Tag> {
        self.tags.iter().find(|t| t.kind == TagKind::Return)
    }

    pub fn find_param_tag(&self, name: &str) -> Option<&Tag> {
        self.tags
            .iter()
            .find(|t| t.kind == TagKind::Param && t.name == name)
    }

    /// The `@var` tag naming `name`, else the first unnamed one.
    pub fn find_var_tag(&self, name: &str) -> Option<&Tag> {
        let vars = || self.tags.iter().filter(|t| t.kind == TagKind::Var);
        vars()
            .find(|t| t.name == name)
            .or_else(|| vars().find(|t| t.name.is_empty()))
    }

    pub fn var_tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter(|t| t.kind == TagKind::Var)
    }

    pub fn property_tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter(|t| t.kind.is_property())
    }

    pub fn method_tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter(|t| t.kind == TagKind::Method)
    }
}

/// Parses a raw `/** ... */` comment. Returns `None` when the comment has
/// neither text nor recognised tags.
pub fn parse(input: &str) -> Option<PhpDoc> {
    let body = strip_decoration(input);

    let mut text_lines = Vec::new();
    let mut blocks: Vec<String> = Vec::new();
    for line in body.lines() {
        let line = line.trim();
        if line.starts_with('@') {
            blocks.push(line.to_string());
        } else if let Some(block) = blocks.last_mut() {
            if !line.is_empty() {
                block.push(' ');
                block.push_str(line);
            }
        } else {
            text_lines.push(line);
        }
    }

    let mut tags = Vec::new();
    for block in &blocks {
        match tag::parse_tag(block) {
            Ok(Some(tag)) => tags.push(tag),
            Ok(None) => {}
            Err(err) => tracing::debug!(%err, "dropping malformed doc tag"),
        }
    }

    let text = text_lines.join("\n").trim().to_string();
    if text.is_empty() && tags.is_empty() {
        return None;
    }
    Some(PhpDoc { text, tags })
}

fn strip_decoration(input: &str) -> String {
    let inner = input.trim();
    let inner = inner
        .strip_prefix("/**")
        .or_else(|| inner.strip_prefix("/*"))
        .unwrap_or(inner);
    let inner = inner.strip_suffix("*/").unwrap_or(inner);
    inner
        .lines()
        .map(|line| {
            let line = line.trim_start();
            let line = line.strip_prefix('*').unwrap_or(line);
            line.strip_prefix(' ').unwrap_or(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_and_tags() {
        let doc = parse(
            "/**\n * Finds a user.\n *\n * @param int $id the\n *   identifier\n * @return User|null\n */",
        )
        .unwrap();
        assert_eq!(doc.text, "Finds a user.");
        assert_eq!(doc.find_param_tag("$id").unwrap().description, "the identifier");
        assert_eq!(doc.return_tag().unwrap().type_string, "User|null");
    }

    #[test]
    fn malformed_tags_are_dropped() {
        let doc = parse("/** @property Foo\n * @property-read Bar $bar */").unwrap();
        let props: Vec<_> = doc.property_tags().collect();
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].kind, TagKind::PropertyRead);
        assert_eq!(props[0].name, "$bar");
    }

    #[test]
    fn inline_var_lookup_falls_back_to_unnamed() {
        let doc = parse("/** @var Widget */").unwrap();
        assert_eq!(doc.find_var_tag("$w").unwrap().type_string, "Widget");
        let doc = parse("/** @var Widget $a\n @var Gadget $b */").unwrap();
        assert_eq!(doc.find_var_tag("$b").unwrap().type_string, "Gadget");
        assert_eq!(doc.var_tags().count(), 2);
    }

    #[test]
    fn empty_comment_is_none() {
        assert_eq!(parse("/** */"), None);
        assert_eq!(parse("/**\n * @internal\n */"), None);
    }
}
