use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::field::{FieldDef, FieldKind};
use super::template::{FieldTemplate, TemplateToken};
use crate::errors::{ArborError, Result};
use crate::model::TreeNode;

/// Field added to freshly-created types
pub const DEFAULT_FIELD_NAME: &str = "Name";

/// Separator joining multiple field values where a single string is needed
pub const DEFAULT_OUTPUT_SEPARATOR: &str = ", ";

/// Matches a trailing line-break or rule tag at the end of a rendered line,
/// any capitalization
static END_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(?:br|hr)[ /]*>$").expect("end tag pattern is valid"));

/// A node type: its field table, title and output templates, and the
/// formatting flags that shape rendered output
///
/// The decorated output view is derived: whenever bullets or tables are
/// active, `baseline_templates` holds the undecorated source of truth and
/// `output_templates` is rebuilt from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFormat {
    pub name: String,
    /// Declaration-ordered field table
    pub fields: Vec<FieldDef>,
    pub title_template: FieldTemplate,
    pub output_templates: Vec<FieldTemplate>,
    baseline_templates: Vec<FieldTemplate>,
    /// Blank line between sibling outputs when rendering a branch
    pub space_between: bool,
    /// Template literals and stored text are authored as HTML
    pub format_html: bool,
    pub bullets: bool,
    pub tables: bool,
    /// Markup wrapped around a whole sibling group's output
    pub sibling_prefix: String,
    pub sibling_suffix: String,
    /// Preferred type for newly-added children; empty means inherit
    pub child_type_hint: String,
    pub icon_name: String,
    pub output_separator: String,
}

impl NodeFormat {
    /// Create an empty type with no fields or templates
    pub fn new(name: &str) -> NodeFormat {
        NodeFormat {
            name: name.to_string(),
            fields: Vec::new(),
            title_template: FieldTemplate::default(),
            output_templates: Vec::new(),
            baseline_templates: Vec::new(),
            space_between: true,
            format_html: false,
            bullets: false,
            tables: false,
            sibling_prefix: String::new(),
            sibling_suffix: String::new(),
            child_type_hint: String::new(),
            icon_name: String::new(),
            output_separator: DEFAULT_OUTPUT_SEPARATOR.to_string(),
        }
    }

    /// Create a type with the standard starter field used for both the
    /// title and the single output line
    pub fn with_default_field(name: &str) -> NodeFormat {
        let mut format = NodeFormat::new(name);
        format
            .fields
            .push(FieldDef::new(DEFAULT_FIELD_NAME, FieldKind::Text));
        let reference = format!("{{*{DEFAULT_FIELD_NAME}*}}");
        format.title_template = FieldTemplate::compile(&reference);
        format.output_templates = vec![FieldTemplate::compile(&reference)];
        format
    }

    pub fn field(&self, field_name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.name == field_name)
    }

    pub fn field_mut(&mut self, field_name: &str) -> Option<&mut FieldDef> {
        self.fields.iter_mut().find(|field| field.name == field_name)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|field| field.name.clone()).collect()
    }

    /// Add a field, rejecting duplicate names
    pub fn add_field(&mut self, field: FieldDef) -> Result<()> {
        if self.field(&field.name).is_some() {
            return Err(ArborError::DuplicateFieldName {
                type_name: self.name.clone(),
                field_name: field.name,
            });
        }
        self.fields.push(field);
        Ok(())
    }

    /// Add a plain text field unless one with that name already exists
    pub fn add_field_if_new(&mut self, field_name: &str) {
        if self.field(field_name).is_none() {
            self.fields.push(FieldDef::new(field_name, FieldKind::Text));
        }
    }

    /// Add plain text fields for every listed name
    ///
    /// With `first_as_title` the title template becomes a reference to
    /// the first name; with `replace_output` the output lines are
    /// replaced by one field-reference line per name, in list order.
    pub fn add_field_list(&mut self, names: &[&str], first_as_title: bool, replace_output: bool) {
        for name in names {
            self.add_field_if_new(name);
        }
        if first_as_title {
            if let Some(first) = names.first() {
                self.change_title_line(&format!("{{*{first}*}}"));
            }
        }
        if replace_output {
            let lines: Vec<String> = names
                .iter()
                .map(|name| format!("{{*{name}*}}"))
                .collect();
            self.change_output_lines(&lines, false);
        }
    }

    /// Reorder the field table to match the given complete name list
    ///
    /// # Errors
    /// * `FieldNotFound` - A listed name is not declared on this type
    /// * `DuplicateFieldName` - A name appears in the list twice
    /// * `Internal` - The list omits a declared field
    pub fn reorder_fields(&mut self, field_names: &[&str]) -> Result<()> {
        let mut reordered: Vec<FieldDef> = Vec::with_capacity(self.fields.len());
        for name in field_names {
            if reordered.iter().any(|field| field.name == *name) {
                return Err(ArborError::DuplicateFieldName {
                    type_name: self.name.clone(),
                    field_name: (*name).to_string(),
                });
            }
            let field = self
                .field(name)
                .cloned()
                .ok_or_else(|| ArborError::FieldNotFound {
                    type_name: self.name.clone(),
                    field_name: (*name).to_string(),
                })?;
            reordered.push(field);
        }
        if reordered.len() != self.fields.len() {
            let missing = self
                .fields
                .iter()
                .find(|field| !field_names.contains(&field.name.as_str()))
                .map(|field| field.name.clone())
                .unwrap_or_default();
            return Err(ArborError::Internal {
                message: format!(
                    "field reorder for type '{}' omits '{missing}'",
                    self.name
                ),
            });
        }
        self.fields = reordered;
        Ok(())
    }

    /// Rename a field and rewrite every template reference to it
    pub fn rename_field(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        if old_name == new_name {
            return Ok(());
        }
        if self.field(new_name).is_some() {
            return Err(ArborError::DuplicateFieldName {
                type_name: self.name.clone(),
                field_name: new_name.to_string(),
            });
        }
        let type_name = self.name.clone();
        let field = self
            .field_mut(old_name)
            .ok_or_else(|| ArborError::FieldNotFound {
                type_name,
                field_name: old_name.to_string(),
            })?;
        field.name = new_name.to_string();
        self.title_template.rename_field(old_name, new_name);
        for template in &mut self.output_templates {
            template.rename_field(old_name, new_name);
        }
        for template in &mut self.baseline_templates {
            template.rename_field(old_name, new_name);
        }
        Ok(())
    }

    /// Drop a field and every substituting reference to it
    ///
    /// Output lines left with no tokens at all are removed from the line
    /// list, in the decorated view and the undecorated baseline alike.
    pub fn remove_field(&mut self, field_name: &str) -> Result<()> {
        let position = self
            .fields
            .iter()
            .position(|field| field.name == field_name)
            .ok_or_else(|| ArborError::FieldNotFound {
                type_name: self.name.clone(),
                field_name: field_name.to_string(),
            })?;
        self.fields.remove(position);
        self.title_template.remove_field(field_name);
        for template in &mut self.output_templates {
            template.remove_field(field_name);
        }
        self.output_templates.retain(|template| !template.is_empty());
        for template in &mut self.baseline_templates {
            template.remove_field(field_name);
        }
        self.baseline_templates
            .retain(|template| !template.is_empty());
        Ok(())
    }

    /// Fill in each field's initial default on a node's data map
    ///
    /// Existing entries are kept unless `overwrite` is set.
    pub fn set_init_default_data(&self, data: &mut HashMap<String, String>, overwrite: bool) {
        for field in &self.fields {
            if let Some(text) = field.default_initial_value() {
                let current = data.get(&field.name).map(String::as_str).unwrap_or("");
                if overwrite || current.is_empty() {
                    data.insert(field.name.clone(), text.to_string());
                }
            }
        }
    }

    /// Render the single-line title for a node
    pub fn render_title(&self, node: &TreeNode) -> String {
        let line = self
            .title_template
            .render_title_line(node, &self.fields, self.format_html);
        line.trim().split('\n').next().unwrap_or("").to_string()
    }

    /// Render the output lines for a node
    ///
    /// A line is kept when `keep_blanks` is set, when at least one field
    /// substituted non-empty text, or when the line has no field tokens at
    /// all. A dropped line in markup output that ends with a break or rule
    /// tag donates that tag to the previous kept line so spacing survives.
    pub fn render_output(&self, node: &TreeNode, plain_text: bool, keep_blanks: bool) -> Vec<String> {
        let mut result: Vec<String> = Vec::new();
        for template in &self.output_templates {
            let line = template.render_output_line(node, &self.fields, plain_text, self.format_html);
            if keep_blanks || line.full_fields > 0 || line.empty_fields == 0 {
                result.push(line.text);
            } else if self.format_html && !plain_text {
                if let (Some(tag), Some(previous)) =
                    (END_TAG_RE.find(&line.text), result.last_mut())
                {
                    previous.push_str(tag.as_str());
                }
            }
        }
        result
    }

    /// Inverse-match a typed title against the title template
    ///
    /// On an exact match each field slot captures its text; when the match
    /// fails but every literal separator is pure whitespace, the whole
    /// title goes to the first field and the rest go empty. Returns the
    /// field-name/stored-value pairs without touching any node.
    pub fn extract_title_data(&self, title: &str) -> Result<Vec<(String, String)>> {
        let mut fields: Vec<&FieldDef> = Vec::new();
        let mut pattern = String::from("^");
        let mut extra_text = String::new();
        for token in self.title_template.tokens() {
            if let Some(field) = super::template::resolve(token, &self.fields) {
                fields.push(field);
                pattern.push_str("(.*)");
            } else {
                let literal = token.source_text();
                pattern.push_str(&regex::escape(&literal));
                extra_text.push_str(&literal);
            }
        }
        pattern.push('$');
        let matcher = Regex::new(&pattern).map_err(|err| ArborError::Internal {
            message: format!("title pattern failed to build: {err}"),
        })?;
        let mismatch = || ArborError::TitleParseMismatch {
            type_name: self.name.clone(),
            title: title.to_string(),
        };
        if let Some(captures) = matcher.captures(title) {
            let mut pairs = Vec::with_capacity(fields.len());
            for (index, field) in fields.iter().enumerate() {
                let text = captures.get(index + 1).map(|m| m.as_str()).unwrap_or("");
                pairs.push((field.name.clone(), field.parse_from_title(text)?));
            }
            Ok(pairs)
        } else if extra_text.trim().is_empty() && !fields.is_empty() {
            let mut pairs = vec![(fields[0].name.clone(), fields[0].parse_from_title(title)?)];
            for field in &fields[1..] {
                pairs.push((field.name.clone(), String::new()));
            }
            Ok(pairs)
        } else {
            Err(mismatch())
        }
    }

    /// Raw text of the title template
    pub fn title_text(&self) -> String {
        self.title_template.to_text()
    }

    /// Raw text of the current (possibly decorated) output lines
    pub fn output_texts(&self) -> Vec<String> {
        self.output_templates
            .iter()
            .map(FieldTemplate::to_text)
            .collect()
    }

    /// Raw text of the undecorated output lines, the form that persists
    /// and that decoration rebuilds from
    pub fn undecorated_texts(&self) -> Vec<String> {
        let source = if self.baseline_templates.is_empty() {
            &self.output_templates
        } else {
            &self.baseline_templates
        };
        source.iter().map(FieldTemplate::to_text).collect()
    }

    /// Replace the title template
    pub fn change_title_line(&mut self, text: &str) {
        self.title_template = FieldTemplate::compile(text);
    }

    /// Replace the output lines, dropping empty compiles unless
    /// `keep_blanks`, then reapply any active decoration to the new lines
    pub fn change_output_lines(&mut self, lines: &[String], keep_blanks: bool) {
        self.output_templates = lines
            .iter()
            .map(|line| FieldTemplate::compile(line))
            .filter(|template| keep_blanks || !template.is_empty())
            .collect();
        self.baseline_templates.clear();
        self.rebuild_decoration();
    }

    /// Append one output line; meant for type construction, before any
    /// decoration is applied
    pub fn add_output_line(&mut self, line: &str) {
        let template = FieldTemplate::compile(line);
        if !template.is_empty() {
            self.output_templates.push(template);
        }
    }

    /// Reapply whichever decoration the flags call for
    pub(crate) fn rebuild_decoration(&mut self) {
        if self.bullets {
            self.apply_bullets();
        } else if self.tables {
            self.apply_tables();
        }
    }

    /// Turn the output lines into a bulleted list item
    ///
    /// Sibling wrapping becomes the list tags; the first line gets the
    /// item-open tag and the last the item-close tag. Reapplying is
    /// idempotent because decoration always rebuilds from the baseline.
    /// The tags are HTML, so this also switches the format to HTML mode.
    pub fn apply_bullets(&mut self) {
        self.snapshot_baseline();
        self.bullets = true;
        self.tables = false;
        self.format_html = true;
        self.sibling_prefix = "<ul>".to_string();
        self.sibling_suffix = "</ul>".to_string();
        let mut lines = self.undecorated_texts();
        if let Some(first) = lines.first_mut() {
            first.insert_str(0, "<li>");
        }
        if let Some(last) = lines.last_mut() {
            last.push_str("</li>");
        }
        self.output_templates = lines
            .iter()
            .map(|line| FieldTemplate::compile(line))
            .collect();
    }

    /// Turn the output lines into one table row per node
    ///
    /// A leading literal ending in `:` becomes that line's column heading;
    /// lines become cell markup with row tags on the first and last. A
    /// header row is synthesized when any heading is non-empty. Lines with
    /// no tokens are skipped rather than decorated.
    pub fn apply_tables(&mut self) {
        self.snapshot_baseline();
        self.tables = true;
        self.bullets = false;
        self.format_html = true;
        let mut cells: Vec<String> = Vec::new();
        let mut headings: Vec<String> = Vec::new();
        for line in self.undecorated_texts() {
            let template = FieldTemplate::compile(&line);
            let leading_literal = match template.tokens().first() {
                Some(TemplateToken::Literal(text)) => Some(text.clone()),
                Some(_) => None,
                None => continue,
            };
            let (head, rest) = match leading_literal {
                Some(text) if text.contains(':') => {
                    let (head, rest) = line.split_once(':').unwrap_or(("", line.as_str()));
                    (head.trim().to_string(), rest.trim().to_string())
                }
                _ => (String::new(), line.trim().to_string()),
            };
            cells.push(rest);
            headings.push(head);
        }
        let mut prefix = String::from("<table border=\"1\" cellpadding=\"3\">");
        if headings.iter().any(|head| !head.is_empty()) {
            prefix.push_str("<tr>");
            for head in &headings {
                prefix.push_str(&format!("<th>{head}</th>"));
            }
            prefix.push_str("</tr>");
        }
        self.sibling_prefix = prefix;
        self.sibling_suffix = "</table>".to_string();
        let mut lines: Vec<String> = cells
            .iter()
            .map(|cell| format!("<td>{cell}</td>"))
            .collect();
        if let Some(first) = lines.first_mut() {
            first.insert_str(0, "<tr>");
        }
        if let Some(last) = lines.last_mut() {
            last.push_str("</tr>");
        }
        self.output_templates = lines
            .iter()
            .map(|line| FieldTemplate::compile(line))
            .collect();
    }

    /// Drop bullet or table decoration and restore the undecorated lines
    pub fn clear_decoration(&mut self) {
        self.bullets = false;
        self.tables = false;
        self.sibling_prefix.clear();
        self.sibling_suffix.clear();
        if !self.baseline_templates.is_empty() {
            self.output_templates = std::mem::take(&mut self.baseline_templates);
        }
    }

    fn snapshot_baseline(&mut self) {
        if self.baseline_templates.is_empty() {
            self.baseline_templates = self.output_templates.clone();
        }
    }
}
