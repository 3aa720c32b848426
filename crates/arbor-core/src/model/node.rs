use std::collections::{BTreeSet, HashMap};

use super::spot::SpotId;

/// TreeNode - the fundamental unit of stored information
///
/// A node pairs a unique identity with a reference to its node type and a
/// map of field-value text. Structure is carried by the ordered child id
/// list; the same child id appearing under several parents makes that child
/// a clone. The spot set caches every tree position currently displaying
/// this node and is rebuilt by the owning structure, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Unique identifier for this node (time-ordered UUID string)
    pub uid: String,

    /// Name of the node type in the format registry
    pub format_name: String,

    /// Field-value text keyed by field name; absent means empty
    pub data: HashMap<String, String>,

    /// Ordered child node ids (identity references, not copies)
    pub child_ids: Vec<String>,

    /// Spot ids currently placing this node (runtime cache)
    pub spot_ids: BTreeSet<SpotId>,
}

impl TreeNode {
    /// Create a new node with the given id and type name
    ///
    /// # Arguments
    /// * `uid` - Unique identifier (typically a UUID string)
    /// * `format_name` - Name of the node type in the registry
    ///
    /// # Returns
    /// A new node with no data, no children and no spots
    pub fn new(uid: String, format_name: String) -> Self {
        Self {
            uid,
            format_name,
            data: HashMap::new(),
            child_ids: Vec::new(),
            spot_ids: BTreeSet::new(),
        }
    }

    /// Stored text for a field, empty when the field has no value
    pub fn field_text(&self, field_name: &str) -> &str {
        self.data.get(field_name).map(String::as_str).unwrap_or("")
    }

    /// Set stored text for a field; empty text removes the entry
    pub fn set_field_text(&mut self, field_name: &str, text: &str) {
        if text.is_empty() {
            self.data.remove(field_name);
        } else {
            self.data.insert(field_name.to_string(), text.to_string());
        }
    }

    /// Check if this node has any children
    pub fn has_children(&self) -> bool {
        !self.child_ids.is_empty()
    }

    /// Check if this node is placed more than once (is a clone)
    pub fn is_cloned(&self) -> bool {
        self.spot_ids.len() > 1
    }

    /// Number of spots currently placing this node
    pub fn spot_count(&self) -> usize {
        self.spot_ids.len()
    }

    /// Register a spot as placing this node
    pub(crate) fn add_spot_ref(&mut self, spot_id: SpotId) {
        self.spot_ids.insert(spot_id);
    }

    /// Drop a spot from this node's placement cache
    pub(crate) fn remove_spot_ref(&mut self, spot_id: SpotId) {
        self.spot_ids.remove(&spot_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node() {
        let node = TreeNode::new("node-1".to_string(), "DEFAULT".to_string());

        assert_eq!(node.uid, "node-1");
        assert_eq!(node.format_name, "DEFAULT");
        assert!(!node.has_children());
        assert!(!node.is_cloned());
        assert_eq!(node.spot_count(), 0);
    }

    #[test]
    fn test_field_text_defaults_empty() {
        let mut node = TreeNode::new("node-1".to_string(), "DEFAULT".to_string());
        assert_eq!(node.field_text("Name"), "");

        node.set_field_text("Name", "Main");
        assert_eq!(node.field_text("Name"), "Main");
    }

    #[test]
    fn test_empty_field_text_removes_entry() {
        let mut node = TreeNode::new("node-1".to_string(), "DEFAULT".to_string());
        node.set_field_text("Name", "Main");
        node.set_field_text("Name", "");

        assert!(!node.data.contains_key("Name"));
    }

    #[test]
    fn test_spot_refs_track_clone_status() {
        let mut node = TreeNode::new("node-1".to_string(), "DEFAULT".to_string());
        node.add_spot_ref(1);
        assert!(!node.is_cloned());

        node.add_spot_ref(2);
        assert!(node.is_cloned());

        node.remove_spot_ref(1);
        assert!(!node.is_cloned());
        assert_eq!(node.spot_count(), 1);
    }
}
