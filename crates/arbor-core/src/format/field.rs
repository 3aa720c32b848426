use serde::{Deserialize, Serialize};

use super::template::{escape_html, strip_markup};
use crate::errors::{ArborError, Result};

/// Closed set of field capabilities
///
/// Stored values are always canonical text; the kind decides how that text
/// renders in plain or markup contexts and what input is accepted when a
/// value is parsed back out of a title line. Unrecognized type tags fall
/// back to [`FieldKind::Text`] at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Plain text, escaped when emitted into markup output
    Text,
    /// Text authored as HTML, passed through to markup output verbatim
    HtmlText,
    /// Numeric text, validated as a decimal number on title parse
    Number,
}

impl FieldKind {
    /// Resolve a persisted type tag, defaulting to plain text
    pub fn from_type_tag(tag: &str) -> FieldKind {
        match tag {
            "HtmlText" => FieldKind::HtmlText,
            "Number" => FieldKind::Number,
            _ => FieldKind::Text,
        }
    }

    /// The persisted type tag for this kind
    pub fn type_tag(&self) -> &'static str {
        match self {
            FieldKind::Text => "Text",
            FieldKind::HtmlText => "HtmlText",
            FieldKind::Number => "Number",
        }
    }

    /// Render a stored value for output
    ///
    /// `plain_text` requests a markup-free surface (titles, text export);
    /// `format_html` says the owning format treats its text as authored
    /// HTML. Empty stored values render as empty without any wrapping.
    pub fn render(&self, stored: &str, plain_text: bool, format_html: bool) -> String {
        if stored.is_empty() {
            return String::new();
        }
        match self {
            FieldKind::Text => {
                if plain_text {
                    strip_markup(stored)
                } else if !format_html {
                    escape_html(stored)
                } else {
                    stored.to_string()
                }
            }
            FieldKind::HtmlText => {
                // stored value is HTML regardless of the format-level flag
                if plain_text {
                    strip_markup(stored)
                } else {
                    stored.to_string()
                }
            }
            FieldKind::Number => stored.to_string(),
        }
    }
}

/// One declared field of a node type
///
/// The declaration order inside a [`NodeFormat`] drives default edit
/// ordering, not render order.
///
/// [`NodeFormat`]: super::NodeFormat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    /// Initial value applied to new nodes of the owning type; empty means
    /// no default
    pub init_default: String,
}

impl FieldDef {
    pub fn new(name: &str, kind: FieldKind) -> FieldDef {
        FieldDef {
            name: name.to_string(),
            kind,
            init_default: String::new(),
        }
    }

    /// Parse text captured from a title line into a stored value
    ///
    /// Numbers must parse as decimals (whitespace-trimmed, empty allowed);
    /// other kinds accept the text as-is.
    pub fn parse_from_title(&self, text: &str) -> Result<String> {
        match self.kind {
            FieldKind::Number => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Ok(String::new());
                }
                trimmed
                    .parse::<f64>()
                    .map_err(|_| ArborError::InvalidFieldValue {
                        field_name: self.name.clone(),
                        value: text.to_string(),
                    })?;
                Ok(trimmed.to_string())
            }
            _ => Ok(text.to_string()),
        }
    }

    /// The value new nodes start with, if any
    pub fn default_initial_value(&self) -> Option<&str> {
        if self.init_default.is_empty() {
            None
        } else {
            Some(&self.init_default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_tag_falls_back_to_text() {
        assert_eq!(FieldKind::from_type_tag("SpacedText"), FieldKind::Text);
        assert_eq!(FieldKind::from_type_tag("Number"), FieldKind::Number);
    }

    #[test]
    fn test_text_render_escapes_for_markup_output() {
        let kind = FieldKind::Text;
        assert_eq!(kind.render("a < b", false, false), "a &lt; b");
        assert_eq!(kind.render("a < b", false, true), "a < b");
        assert_eq!(kind.render("<b>a</b>", true, true), "a");
    }

    #[test]
    fn test_html_text_strips_for_plain_output() {
        let kind = FieldKind::HtmlText;
        assert_eq!(kind.render("<i>x</i>", false, false), "<i>x</i>");
        assert_eq!(kind.render("<i>x</i>", true, false), "x");
    }

    #[test]
    fn test_number_parse_rejects_non_numeric() {
        let field = FieldDef::new("Qty", FieldKind::Number);
        assert_eq!(field.parse_from_title(" 3.5 ").ok(), Some("3.5".to_string()));
        assert_eq!(field.parse_from_title("").ok(), Some(String::new()));
        assert!(matches!(
            field.parse_from_title("many"),
            Err(ArborError::InvalidFieldValue { .. })
        ));
    }

    #[test]
    fn test_default_initial_value() {
        let mut field = FieldDef::new("Status", FieldKind::Text);
        assert_eq!(field.default_initial_value(), None);
        field.init_default = "open".to_string();
        assert_eq!(field.default_initial_value(), Some("open"));
    }
}
