use once_cell::sync::Lazy;
use regex::Regex;

use super::field::FieldDef;
use crate::model::TreeNode;

/// Matches a complete field reference, used to split template text
static FIELD_SPLIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\*(?:\**|\?|!|&|#)[\w.-]+\*\}").expect("field split pattern is valid")
});

/// Captures the modifier and field name out of a single field reference
static FIELD_PART_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\{\*(\**|\?|!|&|#)([\w.-]+)\*\}$").expect("field part pattern is valid")
});

/// Matches HTML tags for markup stripping
static MARKUP_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("markup tag pattern is valid"));

/// Escape text for inclusion in HTML output
pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Remove HTML tags from text and unescape the basic entities
pub(crate) fn strip_markup(text: &str) -> String {
    let stripped = MARKUP_TAG_RE.replace_all(text, "");
    stripped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Collapse all whitespace runs (including newlines) to single spaces
///
/// Deliberately lossy so stored single-line templates survive round trips
/// through multi-line editors.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Modifier prefix inside a field reference
///
/// Only [`FieldModifier::None`] substitutes a value at render time. The
/// other modifiers are reserved for field-capability formatting passes and
/// pass through as literal text here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldModifier {
    /// Plain substitution: `{*name*}`
    None,
    /// Levels-up marker: `{**name*}`, one asterisk per level
    LevelsUp(usize),
    /// Required-exists marker: `{*?name*}`
    Exists,
    /// Required-nonempty marker: `{*!name*}`
    Nonempty,
    /// Join marker: `{*&name*}`
    Join,
    /// Numbered marker: `{*#name*}`
    Numbered,
}

impl FieldModifier {
    fn from_capture(text: &str) -> FieldModifier {
        match text {
            "" => FieldModifier::None,
            "?" => FieldModifier::Exists,
            "!" => FieldModifier::Nonempty,
            "&" => FieldModifier::Join,
            "#" => FieldModifier::Numbered,
            stars => FieldModifier::LevelsUp(stars.len()),
        }
    }

    fn as_text(&self) -> String {
        match self {
            FieldModifier::None => String::new(),
            FieldModifier::LevelsUp(count) => "*".repeat(*count),
            FieldModifier::Exists => "?".to_string(),
            FieldModifier::Nonempty => "!".to_string(),
            FieldModifier::Join => "&".to_string(),
            FieldModifier::Numbered => "#".to_string(),
        }
    }
}

/// One compiled template segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateToken {
    /// Literal text, emitted subject to the escape/strip rules of the
    /// current render mode
    Literal(String),
    /// A field reference; substitutes a value only when the modifier is
    /// empty and the name resolves in the owning type's field table
    FieldRef {
        name: String,
        modifier: FieldModifier,
    },
}

impl TemplateToken {
    /// Reconstruct the raw source text of this token
    pub fn source_text(&self) -> String {
        match self {
            TemplateToken::Literal(text) => text.clone(),
            TemplateToken::FieldRef { name, modifier } => {
                format!("{{*{}{}*}}", modifier.as_text(), name)
            }
        }
    }
}

/// Result of rendering one output line, carrying the field counts used for
/// blank-line suppression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub text: String,
    pub full_fields: usize,
    pub empty_fields: usize,
}

/// A compiled template: an alternating token list of literals and field
/// references parsed from one raw format line
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldTemplate {
    tokens: Vec<TemplateToken>,
}

impl FieldTemplate {
    /// Compile raw template text into a token list
    ///
    /// Whitespace runs are collapsed to single spaces first. Anything that
    /// is not a syntactically complete field reference stays literal, so
    /// compilation never fails.
    pub fn compile(raw: &str) -> FieldTemplate {
        let text = normalize_whitespace(raw);
        let mut tokens = Vec::new();
        let mut last = 0;
        for found in FIELD_SPLIT_RE.find_iter(&text) {
            if found.start() > last {
                push_literal(&mut tokens, &text[last..found.start()]);
            }
            match FIELD_PART_RE.captures(found.as_str()) {
                Some(caps) => {
                    let modifier = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                    let name = caps.get(2).map(|m| m.as_str()).unwrap_or("");
                    tokens.push(TemplateToken::FieldRef {
                        name: name.to_string(),
                        modifier: FieldModifier::from_capture(modifier),
                    });
                }
                None => push_literal(&mut tokens, found.as_str()),
            }
            last = found.end();
        }
        if last < text.len() {
            push_literal(&mut tokens, &text[last..]);
        }
        FieldTemplate { tokens }
    }

    /// The compiled token list
    pub fn tokens(&self) -> &[TemplateToken] {
        &self.tokens
    }

    /// Check if this template has no tokens at all
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Reconstruct the raw text form, the inverse of [`compile`]
    ///
    /// [`compile`]: FieldTemplate::compile
    pub fn to_text(&self) -> String {
        self.tokens
            .iter()
            .map(TemplateToken::source_text)
            .collect::<Vec<_>>()
            .join("")
    }

    /// Render for an output line, counting full and empty substitutions
    ///
    /// Literal segments (including unresolved field references) are
    /// HTML-escaped when the format is not HTML-authored and the output is
    /// for a markup context, and markup-stripped when an HTML-authored
    /// format renders to plain text.
    pub fn render_output_line(
        &self,
        node: &TreeNode,
        fields: &[FieldDef],
        plain_text: bool,
        format_html: bool,
    ) -> RenderedLine {
        let mut text = String::new();
        let mut full_fields = 0;
        let mut empty_fields = 0;
        for token in &self.tokens {
            if let Some(field) = resolve(token, fields) {
                let rendered = field
                    .kind
                    .render(node.field_text(&field.name), plain_text, format_html);
                if rendered.is_empty() {
                    empty_fields += 1;
                } else {
                    full_fields += 1;
                }
                text.push_str(&rendered);
            } else {
                let literal = token.source_text();
                if !format_html && !plain_text {
                    text.push_str(&escape_html(&literal));
                } else if format_html && plain_text {
                    text.push_str(&strip_markup(&literal));
                } else {
                    text.push_str(&literal);
                }
            }
        }
        RenderedLine {
            text,
            full_fields,
            empty_fields,
        }
    }

    /// Render for the title line
    ///
    /// Titles are a plain-text surface: fields render in plain-text mode
    /// and literal segments pass through untouched, so the result stays
    /// matchable by the title inverse pattern.
    pub fn render_title_line(
        &self,
        node: &TreeNode,
        fields: &[FieldDef],
        format_html: bool,
    ) -> String {
        let mut text = String::new();
        for token in &self.tokens {
            if let Some(field) = resolve(token, fields) {
                text.push_str(&field.kind.render(
                    node.field_text(&field.name),
                    true,
                    format_html,
                ));
            } else {
                text.push_str(&token.source_text());
            }
        }
        text
    }

    /// Rename every field reference to `old_name`, any modifier included
    pub fn rename_field(&mut self, old_name: &str, new_name: &str) {
        for token in &mut self.tokens {
            if let TemplateToken::FieldRef { name, .. } = token {
                if name == old_name {
                    *name = new_name.to_string();
                }
            }
        }
    }

    /// Delete every plain (substituting) reference to `field_name`
    pub fn remove_field(&mut self, field_name: &str) {
        self.tokens.retain(|token| {
            !matches!(token, TemplateToken::FieldRef { name, modifier }
                if name == field_name && *modifier == FieldModifier::None)
        });
    }
}

/// Resolve a token against a field table
///
/// Only a plain-modifier reference whose name is declared resolves; all
/// other tokens render as literal text.
pub(crate) fn resolve<'a>(token: &TemplateToken, fields: &'a [FieldDef]) -> Option<&'a FieldDef> {
    match token {
        TemplateToken::FieldRef { name, modifier } if *modifier == FieldModifier::None => {
            fields.iter().find(|field| field.name == *name)
        }
        _ => None,
    }
}

fn push_literal(tokens: &mut Vec<TemplateToken>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(TemplateToken::Literal(existing)) = tokens.last_mut() {
        existing.push_str(text);
    } else {
        tokens.push(TemplateToken::Literal(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::field::FieldKind;

    fn text_fields(names: &[&str]) -> Vec<FieldDef> {
        names
            .iter()
            .map(|name| FieldDef::new(name, FieldKind::Text))
            .collect()
    }

    #[test]
    fn test_compile_splits_literals_and_fields() {
        let template = FieldTemplate::compile("{*Name*}: {*Qty*}");
        assert_eq!(
            template.tokens(),
            &[
                TemplateToken::FieldRef {
                    name: "Name".to_string(),
                    modifier: FieldModifier::None,
                },
                TemplateToken::Literal(": ".to_string()),
                TemplateToken::FieldRef {
                    name: "Qty".to_string(),
                    modifier: FieldModifier::None,
                },
            ]
        );
    }

    #[test]
    fn test_compile_normalizes_whitespace() {
        let template = FieldTemplate::compile("a\n  b\t{*F*}");
        assert_eq!(template.to_text(), "a b {*F*}");
    }

    #[test]
    fn test_compile_keeps_malformed_reference_literal() {
        let template = FieldTemplate::compile("{*unclosed");
        assert_eq!(
            template.tokens(),
            &[TemplateToken::Literal("{*unclosed".to_string())]
        );
    }

    #[test]
    fn test_compile_parses_modifiers() {
        let template = FieldTemplate::compile("{*?A*}{*!B*}{*&C*}{*#D*}{***E*}");
        let modifiers: Vec<_> = template
            .tokens()
            .iter()
            .map(|token| match token {
                TemplateToken::FieldRef { modifier, .. } => modifier.clone(),
                TemplateToken::Literal(_) => panic!("expected field ref"),
            })
            .collect();
        assert_eq!(
            modifiers,
            vec![
                FieldModifier::Exists,
                FieldModifier::Nonempty,
                FieldModifier::Join,
                FieldModifier::Numbered,
                FieldModifier::LevelsUp(2),
            ]
        );
    }

    #[test]
    fn test_to_text_round_trip() {
        let source = "start {*A*} mid {*?B*} end";
        let template = FieldTemplate::compile(source);
        assert_eq!(template.to_text(), source);
        assert_eq!(FieldTemplate::compile(&template.to_text()), template);
    }

    #[test]
    fn test_unresolved_reference_renders_literally() {
        let node = TreeNode::new("n1".to_string(), "T".to_string());
        let template = FieldTemplate::compile("{*Missing*}");
        let line = template.render_output_line(&node, &text_fields(&[]), false, false);
        assert_eq!(line.text, "{*Missing*}");
        assert_eq!(line.full_fields, 0);
        assert_eq!(line.empty_fields, 0);
    }

    #[test]
    fn test_modifier_reference_renders_literally() {
        let mut node = TreeNode::new("n1".to_string(), "T".to_string());
        node.set_field_text("A", "value");
        let template = FieldTemplate::compile("{*?A*}");
        let line = template.render_output_line(&node, &text_fields(&["A"]), false, false);
        assert_eq!(line.text, "{*?A*}");
        assert_eq!(line.full_fields, 0);
    }

    #[test]
    fn test_render_counts_full_and_empty_fields() {
        let mut node = TreeNode::new("n1".to_string(), "T".to_string());
        node.set_field_text("A", "x");
        let template = FieldTemplate::compile("{*A*}, {*B*}");
        let line = template.render_output_line(&node, &text_fields(&["A", "B"]), false, false);
        assert_eq!(line.text, "x, ");
        assert_eq!(line.full_fields, 1);
        assert_eq!(line.empty_fields, 1);
    }

    #[test]
    fn test_literal_escaped_for_markup_output() {
        let node = TreeNode::new("n1".to_string(), "T".to_string());
        let template = FieldTemplate::compile("a & b < c");
        let line = template.render_output_line(&node, &[], false, false);
        assert_eq!(line.text, "a &amp; b &lt; c");
    }

    #[test]
    fn test_literal_stripped_for_plain_text_html_format() {
        let node = TreeNode::new("n1".to_string(), "T".to_string());
        let template = FieldTemplate::compile("<b>bold</b> text");
        let line = template.render_output_line(&node, &[], true, true);
        assert_eq!(line.text, "bold text");
    }

    #[test]
    fn test_rename_field_rewrites_all_modifiers() {
        let mut template = FieldTemplate::compile("{*Old*} and {*?Old*}");
        template.rename_field("Old", "New");
        assert_eq!(template.to_text(), "{*New*} and {*?New*}");
    }

    #[test]
    fn test_remove_field_keeps_modifier_references() {
        let mut template = FieldTemplate::compile("{*A*}x{*?A*}");
        template.remove_field("A");
        assert_eq!(template.to_text(), "x{*?A*}");
    }

    #[test]
    fn test_strip_markup_unescapes_entities() {
        assert_eq!(strip_markup("<i>a</i> &amp; b"), "a & b");
    }
}
