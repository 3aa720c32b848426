use thiserror::Error;

/// Result type alias using ArborError
pub type Result<T> = std::result::Result<T, ArborError>;

/// Comprehensive error taxonomy for arbor operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArborError {
    // ===== Lookup Errors =====
    /// Node id is not registered in the structure
    #[error("Node not found: {node_id}")]
    NodeNotFound { node_id: String },

    /// Spot id is not registered in the structure
    #[error("Spot not found: {spot_id}")]
    SpotNotFound { spot_id: u64 },

    /// Node type name is not registered in the format registry
    #[error("Node type not found: {type_name}")]
    TypeNotFound { type_name: String },

    /// Field name is not defined on the node type
    #[error("Field '{field_name}' not found in type '{type_name}'")]
    FieldNotFound {
        type_name: String,
        field_name: String,
    },

    // ===== Parsing Errors =====
    /// Title text does not match the title template pattern
    #[error("Title '{title}' does not match the title pattern of type '{type_name}'")]
    TitleParseMismatch { type_name: String, title: String },

    /// Stored field value failed the field capability's parse/format contract
    #[error("Invalid value for field '{field_name}': {value}")]
    InvalidFieldValue { field_name: String, value: String },

    // ===== Structural Errors =====
    /// Incoming node id collides with an id already in the structure
    #[error("Duplicate node identity: {node_id}")]
    DuplicateIdentity { node_id: String },

    /// A node already holds this child id (single membership per parent)
    #[error("Node {parent_id} already has child {child_id}")]
    DuplicateChild {
        parent_id: String,
        child_id: String,
    },

    /// Attaching here would make a node its own ancestor
    #[error("Illegal move: attaching {child_id} under {parent_id} would create a cycle")]
    IllegalMove {
        parent_id: String,
        child_id: String,
    },

    /// A child list references an id with no entry in the node table
    #[error("Node {parent_id} references unknown child: {child_id}")]
    ChildRefUnknown {
        parent_id: String,
        child_id: String,
    },

    /// A registered node is not reachable from any top-level position
    #[error("Orphaned node retained in structure: {node_id}")]
    OrphanLeak { node_id: String },

    // ===== Format Errors =====
    /// Type name collides with an existing registry entry
    #[error("Node type already exists: {type_name}")]
    DuplicateTypeName { type_name: String },

    /// Field name collides with an existing field in the same type
    #[error("Field '{field_name}' already exists in type '{type_name}'")]
    DuplicateFieldName {
        type_name: String,
        field_name: String,
    },

    /// Type is still referenced by nodes and cannot be removed
    #[error("Node type '{type_name}' is in use by {node_count} node(s)")]
    TypeInUse {
        type_name: String,
        node_count: usize,
    },

    // ===== History Errors =====
    /// Undo requested with an empty undo stack
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Redo requested with an empty redo stack
    #[error("Nothing to redo")]
    NothingToRedo,

    // ===== File Errors =====
    /// File could not be read
    #[error("Cannot read '{path}': {message}")]
    FileRead { path: String, message: String },

    /// File could not be written
    #[error("Cannot write '{path}': {message}")]
    FileWrite { path: String, message: String },

    /// File content is not a valid document encoding
    #[error("Malformed document file: {message}")]
    MalformedFile { message: String },

    // ===== Generic Errors =====
    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Conversion from serde_json::Error to ArborError
impl From<serde_json::Error> for ArborError {
    fn from(err: serde_json::Error) -> Self {
        ArborError::MalformedFile {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_context() {
        let err = ArborError::FieldNotFound {
            type_name: "TASK".into(),
            field_name: "Owner".into(),
        };
        assert_eq!(err.to_string(), "Field 'Owner' not found in type 'TASK'");
    }

    #[test]
    fn test_serde_error_maps_to_malformed_file() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{broken").unwrap_err();
        let err: ArborError = parse_err.into();
        assert!(matches!(err, ArborError::MalformedFile { .. }));
    }

    #[test]
    fn test_errors_compare_by_payload() {
        let a = ArborError::NodeNotFound { node_id: "n1".into() };
        let b = ArborError::NodeNotFound { node_id: "n1".into() };
        assert_eq!(a, b);
    }
}
