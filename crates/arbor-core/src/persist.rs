//! Document persistence
//!
//! Encodes a structure into the document file format: a name-sorted
//! format list, a uid-sorted node list with field values inlined beside
//! the fixed keys, and a properties block naming the top-level nodes.
//! Formats store their undecorated output lines; bullet and table
//! markup is rebuilt from the flags at load time.
//!
//! Loading is all-or-nothing: the content is parsed, rebuilt, and
//! graph-validated before any structure is returned, so a failed load
//! never leaves a partially-populated document. The same encoding
//! doubles as the clipboard payload via [`structure_to_json`] and
//! [`structure_from_json`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{ArborError, Result};
use crate::format::{FieldDef, FieldKind, NodeFormat, DEFAULT_OUTPUT_SEPARATOR};
use crate::model::TreeNode;
use crate::ops::TreeStructure;
use crate::rules::validate_graph;

/// Node keys that field values must not shadow
const RESERVED_NODE_KEYS: [&str; 3] = ["uid", "format", "children"];

/// Top-level document file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileData {
    /// Type definitions, sorted by name
    pub formats: Vec<FormatData>,

    /// Every node identity, sorted by uid
    pub nodes: Vec<NodeData>,

    /// Document-level properties
    pub properties: Properties,
}

/// One node type in a document file
///
/// Flags at their default value are omitted from the encoding; absent
/// keys read back as the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatData {
    /// Unique type name
    pub formatname: String,

    /// Field declarations in table order
    pub fields: Vec<FieldData>,

    /// Title template text
    pub titleline: String,

    /// Undecorated output template texts
    pub outputlines: Vec<String>,

    /// Present only when false (default is true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacebetween: Option<bool>,

    /// Present only when true
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formathtml: Option<bool>,

    /// Present only when true
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bullets: Option<bool>,

    /// Present only when true
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<bool>,

    /// Preferred child type, when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub childtype: Option<String>,

    /// Icon name, when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Output field separator, when not the default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputsep: Option<String>,
}

/// One field declaration within a type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldData {
    /// Field name
    pub fieldname: String,

    /// Capability tag; unknown tags fall back to plain text
    pub fieldtype: String,

    /// Initial value for new nodes, when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init: Option<String>,
}

/// One node identity; field values sit beside the fixed keys
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    /// Unique node id
    pub uid: String,

    /// Type name, resolved against the format list
    pub format: String,

    /// Ordered child ids; omitted when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,

    /// Field-name to value-text mapping, inlined into the node object
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

/// Document-level properties
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Properties {
    /// Version of the program that wrote the file
    pub tlversion: String,

    /// Top-level node ids in display order
    pub topnodes: Vec<String>,
}

/// Build the file encoding of a structure
pub fn file_data(structure: &TreeStructure) -> FileData {
    let formats = structure
        .formats
        .sorted_formats()
        .into_iter()
        .map(format_data)
        .collect();
    let mut nodes: Vec<NodeData> = structure.nodes.values().map(node_data).collect();
    nodes.sort_by(|a, b| a.uid.cmp(&b.uid));
    FileData {
        formats,
        nodes,
        properties: Properties {
            tlversion: env!("CARGO_PKG_VERSION").to_string(),
            topnodes: structure.top_level_ids.clone(),
        },
    }
}

/// Encode a structure as document JSON
///
/// This string is both the file content and the clipboard payload.
///
/// # Errors
/// * `MalformedFile` - If the data cannot be encoded
pub fn structure_to_json(structure: &TreeStructure) -> Result<String> {
    Ok(serde_json::to_string_pretty(&file_data(structure))?)
}

/// Encode and write a document file
///
/// The in-memory structure is untouched if the write fails.
///
/// # Arguments
/// * `structure` - The structure to save
/// * `path` - Destination file path
///
/// # Errors
/// * `FileWrite` - If the file cannot be written
pub fn save_file(structure: &TreeStructure, path: &Path) -> Result<()> {
    let content = structure_to_json(structure)?;
    fs::write(path, content).map_err(|err| ArborError::FileWrite {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    tracing::debug!(
        path = %path.display(),
        nodes = structure.node_count(),
        "document saved"
    );
    Ok(())
}

/// Read and decode a document file
///
/// # Arguments
/// * `path` - Source file path
///
/// # Returns
/// A fully-built structure with spots refreshed
///
/// # Errors
/// * `FileRead` - If the file cannot be read
/// * `MalformedFile` - If the content is not a valid document encoding
/// * `DuplicateTypeName` / `DuplicateIdentity` / `TypeNotFound` - If the
///   document's tables collide or don't resolve
/// * Graph errors from [`validate_graph`] - If child references are
///   broken, duplicated, cyclic, or unreachable
pub fn load_file(path: &Path) -> Result<TreeStructure> {
    let content = fs::read_to_string(path).map_err(|err| ArborError::FileRead {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    structure_from_json(&content)
}

/// Decode a structure from document JSON
///
/// # Errors
/// Same as [`load_file`], minus the file read
pub fn structure_from_json(content: &str) -> Result<TreeStructure> {
    let data: FileData = serde_json::from_str(content)?;
    structure_from_file_data(data)
}

/// Build a structure from decoded file data
///
/// # Errors
/// Same as [`structure_from_json`], minus the parse
pub fn structure_from_file_data(data: FileData) -> Result<TreeStructure> {
    let mut structure = TreeStructure::new();
    for format in data.formats {
        structure.formats.insert(build_format(format)?)?;
    }
    for node in data.nodes {
        if structure.node_exists(&node.uid) {
            return Err(ArborError::DuplicateIdentity { node_id: node.uid });
        }
        if !structure.formats.contains(&node.format) {
            return Err(ArborError::TypeNotFound {
                type_name: node.format,
            });
        }
        let mut built = TreeNode::new(node.uid, node.format);
        built.child_ids = node.children;
        built.data = node.fields.into_iter().collect();
        structure.insert_node(built);
    }
    structure.top_level_ids = data.properties.topnodes;
    validate_graph(&structure)?;
    structure.refresh_spots();
    tracing::debug!(
        nodes = structure.node_count(),
        formats = structure.formats.len(),
        "document loaded"
    );
    Ok(structure)
}

fn format_data(format: &NodeFormat) -> FormatData {
    let outputlines = {
        let lines = format.undecorated_texts();
        if lines.is_empty() {
            vec![String::new()]
        } else {
            lines
        }
    };
    FormatData {
        formatname: format.name.clone(),
        fields: format
            .fields
            .iter()
            .map(|field| FieldData {
                fieldname: field.name.clone(),
                fieldtype: field.kind.type_tag().to_string(),
                init: if field.init_default.is_empty() {
                    None
                } else {
                    Some(field.init_default.clone())
                },
            })
            .collect(),
        titleline: format.title_text(),
        outputlines,
        spacebetween: if format.space_between { None } else { Some(false) },
        formathtml: format.format_html.then_some(true),
        bullets: format.bullets.then_some(true),
        tables: format.tables.then_some(true),
        childtype: some_if_set(&format.child_type_hint),
        icon: some_if_set(&format.icon_name),
        outputsep: if format.output_separator == DEFAULT_OUTPUT_SEPARATOR {
            None
        } else {
            Some(format.output_separator.clone())
        },
    }
}

fn some_if_set(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn node_data(node: &TreeNode) -> NodeData {
    let mut fields = BTreeMap::new();
    for (name, value) in &node.data {
        if RESERVED_NODE_KEYS.contains(&name.as_str()) {
            tracing::warn!(
                node_id = %node.uid,
                field = %name,
                "field name collides with a document key, value not saved"
            );
            continue;
        }
        fields.insert(name.clone(), value.clone());
    }
    NodeData {
        uid: node.uid.clone(),
        format: node.format_name.clone(),
        children: node.child_ids.clone(),
        fields,
    }
}

fn build_format(data: FormatData) -> Result<NodeFormat> {
    let mut format = NodeFormat::new(&data.formatname);
    for field in data.fields {
        let mut def = FieldDef::new(&field.fieldname, FieldKind::from_type_tag(&field.fieldtype));
        if let Some(init) = field.init {
            def.init_default = init;
        }
        format.add_field(def)?;
    }
    format.change_title_line(&data.titleline);
    format.change_output_lines(&data.outputlines, false);
    format.space_between = data.spacebetween.unwrap_or(true);
    format.format_html = data.formathtml.unwrap_or(false);
    format.bullets = data.bullets.unwrap_or(false);
    format.tables = data.tables.unwrap_or(false);
    format.child_type_hint = data.childtype.unwrap_or_default();
    format.icon_name = data.icon.unwrap_or_default();
    format.output_separator = data
        .outputsep
        .unwrap_or_else(|| DEFAULT_OUTPUT_SEPARATOR.to_string());
    format.rebuild_decoration();
    Ok(format)
}
