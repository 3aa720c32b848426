use std::collections::{BTreeSet, HashMap, HashSet};

use uuid::Uuid;

use crate::errors::{ArborError, Result};
use crate::format::{FormatChanges, FormatRegistry};
use crate::model::{Spot, SpotId, TreeNode};
use crate::undo::UndoLog;

/// Title given to the starter node of a fresh document
pub const DEFAULT_ROOT_TITLE: &str = "Main";

/// In-memory store for a whole outline document
///
/// Owns the node identity table, the format registry, the top-level id
/// list and the derived spot table. Not thread-safe (no Arc/RwLock) -
/// designed for single-threaded use, one instance per open document.
///
/// The child-identity lists on nodes are the only structural authority;
/// spots are a cached positional view rebuilt by [`refresh_spots`] after
/// every structural mutation.
///
/// [`refresh_spots`]: TreeStructure::refresh_spots
#[derive(Debug, Clone, Default)]
pub struct TreeStructure {
    /// Map of node ID to node, the sole owner of node identities
    pub(crate) nodes: HashMap<String, TreeNode>,
    /// The document's node types
    pub formats: FormatRegistry,
    /// Ordered ids of the top-level nodes
    pub top_level_ids: Vec<String>,
    /// Derived positional records, keyed by spot id
    pub(crate) spots: HashMap<SpotId, Spot>,
    next_spot_id: SpotId,
    /// Undo and redo history for this document
    pub undo_log: UndoLog,
}

impl TreeStructure {
    /// Create a new empty structure with no types and no nodes
    pub fn new() -> Self {
        TreeStructure::default()
    }

    /// Create a structure with the starter type and a single root node
    pub fn with_defaults() -> Self {
        let mut structure = TreeStructure::new();
        structure.formats = FormatRegistry::with_default();
        let uid = Uuid::now_v7().to_string();
        let mut node = TreeNode::new(uid.clone(), crate::format::DEFAULT_TYPE_NAME.to_string());
        node.set_field_text(crate::format::DEFAULT_FIELD_NAME, DEFAULT_ROOT_TITLE);
        structure.nodes.insert(uid.clone(), node);
        structure.top_level_ids.push(uid.clone());
        structure.refresh_spots();
        tracing::debug!(node_id = %uid, "created default document");
        structure
    }

    /// Get a node by ID
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node doesn't exist.
    pub fn get_node(&self, id: &str) -> Result<&TreeNode> {
        self.nodes.get(id).ok_or_else(|| ArborError::NodeNotFound {
            node_id: id.to_string(),
        })
    }

    /// Get a mutable reference to a node by ID
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if the node doesn't exist.
    pub fn get_node_mut(&mut self, id: &str) -> Result<&mut TreeNode> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| ArborError::NodeNotFound {
                node_id: id.to_string(),
            })
    }

    pub fn node_exists(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node ids in sorted order, the order used for persistence
    pub fn sorted_node_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.nodes.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Insert a node into the identity table without attaching it
    ///
    /// The caller must attach the id under a parent (or the top level) and
    /// refresh spots before the structure is observed again.
    pub(crate) fn insert_node(&mut self, node: TreeNode) {
        self.nodes.insert(node.uid.clone(), node);
    }

    /// Get a spot by ID
    ///
    /// # Errors
    ///
    /// Returns `SpotNotFound` if the spot doesn't exist.
    pub fn spot(&self, spot_id: SpotId) -> Result<&Spot> {
        self.spots
            .get(&spot_id)
            .ok_or(ArborError::SpotNotFound { spot_id })
    }

    pub fn spot_exists(&self, spot_id: SpotId) -> bool {
        self.spots.contains_key(&spot_id)
    }

    pub fn spot_count(&self) -> usize {
        self.spots.len()
    }

    /// All spots denoting a node, in spot-id order
    pub fn spots_for_node(&self, node_id: &str) -> Vec<&Spot> {
        let mut spots: Vec<&Spot> = self
            .spots
            .values()
            .filter(|spot| spot.node_id == node_id)
            .collect();
        spots.sort_by_key(|spot| spot.id);
        spots
    }

    /// The top-level spots in document order
    pub fn top_spots(&self) -> Vec<&Spot> {
        self.top_level_ids
            .iter()
            .filter_map(|id| {
                self.spots
                    .values()
                    .find(|spot| spot.parent.is_none() && spot.node_id == *id)
            })
            .collect()
    }

    /// The child spots of a spot, in child-list order
    pub fn child_spots(&self, spot_id: SpotId) -> Result<Vec<&Spot>> {
        let spot = self.spot(spot_id)?;
        let node = self.get_node(&spot.node_id)?;
        Ok(node
            .child_ids
            .iter()
            .filter_map(|child_id| {
                self.spots
                    .values()
                    .find(|s| s.parent == Some(spot_id) && s.node_id == *child_id)
            })
            .collect())
    }

    /// The node ids of the parent's child list; `None` means the top level
    pub fn child_ids_at(&self, parent_spot: Option<SpotId>) -> Result<Vec<String>> {
        match parent_spot {
            None => Ok(self.top_level_ids.clone()),
            Some(spot_id) => {
                let spot = self.spot(spot_id)?;
                Ok(self.get_node(&spot.node_id)?.child_ids.clone())
            }
        }
    }

    /// Rebuild the spot table from the child-identity graph
    ///
    /// Spots whose parent/node edge is unchanged keep their ids. Nodes
    /// left with no spot are purged from the identity table along with
    /// every exclusively-owned descendant. An id already on a spot's
    /// ancestor path is not descended into again, which keeps the walk
    /// finite on malformed cyclic input.
    pub fn refresh_spots(&mut self) {
        let mut known_edges: HashMap<(Option<SpotId>, String), SpotId> = self
            .spots
            .values()
            .map(|spot| ((spot.parent, spot.node_id.clone()), spot.id))
            .collect();
        let mut kept: HashMap<SpotId, Spot> = HashMap::new();
        let mut stack: Vec<(Option<SpotId>, String)> = self
            .top_level_ids
            .iter()
            .rev()
            .map(|id| (None, id.clone()))
            .collect();
        while let Some((parent, node_id)) = stack.pop() {
            let Some(node) = self.nodes.get(&node_id) else {
                continue;
            };
            if Self::on_ancestor_path(&kept, parent, &node_id) {
                continue;
            }
            let key = (parent, node_id.clone());
            let spot_id = match known_edges.get(&key) {
                Some(&id) => id,
                None => {
                    let id = self.next_spot_id;
                    self.next_spot_id += 1;
                    known_edges.insert(key, id);
                    id
                }
            };
            if kept.contains_key(&spot_id) {
                continue;
            }
            kept.insert(spot_id, Spot::new(spot_id, node_id.clone(), parent));
            for child_id in node.child_ids.iter().rev() {
                stack.push((Some(spot_id), child_id.clone()));
            }
        }
        self.spots = kept;

        let mut spot_sets: HashMap<String, BTreeSet<SpotId>> = HashMap::new();
        for spot in self.spots.values() {
            spot_sets
                .entry(spot.node_id.clone())
                .or_default()
                .insert(spot.id);
        }
        let mut purged: Vec<String> = Vec::new();
        self.nodes.retain(|id, node| match spot_sets.remove(id) {
            Some(spot_ids) => {
                node.spot_ids = spot_ids;
                true
            }
            None => {
                purged.push(id.clone());
                false
            }
        });
        if !purged.is_empty() {
            purged.sort();
            tracing::debug!(count = purged.len(), "purged unreferenced nodes");
        }
    }

    fn on_ancestor_path(
        kept: &HashMap<SpotId, Spot>,
        mut parent: Option<SpotId>,
        node_id: &str,
    ) -> bool {
        while let Some(parent_id) = parent {
            match kept.get(&parent_id) {
                Some(spot) => {
                    if spot.node_id == node_id {
                        return true;
                    }
                    parent = spot.parent;
                }
                None => break,
            }
        }
        false
    }

    /// Attach an existing node id under a parent spot (or the top level)
    ///
    /// Creates a new spot for the node and each of its descendants; used
    /// both for fresh inserts and for cloning a node into a second
    /// position. Returns the new spot's id.
    ///
    /// # Errors
    ///
    /// * `NodeNotFound` - the child id is not in the identity table
    /// * `SpotNotFound` - the parent spot doesn't exist
    /// * `DuplicateChild` - the target child list already holds this id
    /// * `IllegalMove` - attaching would make the node its own ancestor
    pub fn attach_child(
        &mut self,
        parent_spot: Option<SpotId>,
        child_id: &str,
        position: Option<usize>,
    ) -> Result<SpotId> {
        let parent_node_id = self.validate_attach(parent_spot, child_id)?;
        match parent_node_id {
            None => {
                let index = position.unwrap_or(self.top_level_ids.len());
                let index = index.min(self.top_level_ids.len());
                self.top_level_ids.insert(index, child_id.to_string());
            }
            Some(parent_node_id) => {
                let parent = self.get_node_mut(&parent_node_id)?;
                let index = position.unwrap_or(parent.child_ids.len());
                let index = index.min(parent.child_ids.len());
                parent.child_ids.insert(index, child_id.to_string());
            }
        }
        self.refresh_spots();
        tracing::debug!(node_id = %child_id, "attached child");
        self.spots
            .values()
            .find(|spot| spot.parent == parent_spot && spot.node_id == child_id)
            .map(|spot| spot.id)
            .ok_or_else(|| ArborError::Internal {
                message: format!("no spot created for attached node {child_id}"),
            })
    }

    /// Move the placement a spot stands for to a new parent or position
    ///
    /// When the destination is the same parent identity this reorders the
    /// shared child list; otherwise the edge is removed and re-created
    /// under the target with the same guards as a fresh attach. Other
    /// placements of the node stay where they are. `position` indexes the
    /// destination list after the old edge is gone; out-of-range appends.
    /// Returns the moved placement's spot id.
    ///
    /// # Errors
    ///
    /// * `SpotNotFound` - the spot or the target parent spot doesn't exist
    /// * `DuplicateChild` - the target child list already holds this node
    /// * `IllegalMove` - the target sits inside the node's own subtree
    pub fn move_child(
        &mut self,
        spot_id: SpotId,
        new_parent_spot: Option<SpotId>,
        position: Option<usize>,
    ) -> Result<SpotId> {
        let spot = self.spot(spot_id)?.clone();
        let old_parent_node_id = match spot.parent {
            None => None,
            Some(parent_spot) => Some(self.spot(parent_spot)?.node_id.clone()),
        };
        let new_parent_node_id = match new_parent_spot {
            None => None,
            Some(parent_spot) => Some(self.spot(parent_spot)?.node_id.clone()),
        };

        if old_parent_node_id == new_parent_node_id {
            let list = match &old_parent_node_id {
                None => &mut self.top_level_ids,
                Some(parent_id) => &mut self.get_node_mut(parent_id)?.child_ids,
            };
            let from = list
                .iter()
                .position(|id| *id == spot.node_id)
                .ok_or_else(|| ArborError::Internal {
                    message: format!("spot {spot_id} missing from its parent child list"),
                })?;
            list.remove(from);
            let index = position.unwrap_or(list.len()).min(list.len());
            list.insert(index, spot.node_id.clone());
            self.refresh_spots();
            tracing::debug!(node_id = %spot.node_id, spot_id, "reordered spot");
            return Ok(spot_id);
        }

        self.validate_attach(new_parent_spot, &spot.node_id)?;
        match &old_parent_node_id {
            None => {
                if let Some(index) = self
                    .top_level_ids
                    .iter()
                    .position(|id| *id == spot.node_id)
                {
                    self.top_level_ids.remove(index);
                }
            }
            Some(parent_id) => {
                let parent = self.get_node_mut(parent_id)?;
                if let Some(index) = parent
                    .child_ids
                    .iter()
                    .position(|id| *id == spot.node_id)
                {
                    parent.child_ids.remove(index);
                }
            }
        }
        match &new_parent_node_id {
            None => {
                let index = position
                    .unwrap_or(self.top_level_ids.len())
                    .min(self.top_level_ids.len());
                self.top_level_ids.insert(index, spot.node_id.clone());
            }
            Some(parent_id) => {
                let parent = self.get_node_mut(parent_id)?;
                let index = position
                    .unwrap_or(parent.child_ids.len())
                    .min(parent.child_ids.len());
                parent.child_ids.insert(index, spot.node_id.clone());
            }
        }
        self.refresh_spots();
        tracing::debug!(node_id = %spot.node_id, spot_id, "moved spot");
        self.spots
            .values()
            .find(|moved| moved.parent == new_parent_spot && moved.node_id == spot.node_id)
            .map(|moved| moved.id)
            .ok_or_else(|| ArborError::Internal {
                message: format!("no spot created for moved node {}", spot.node_id),
            })
    }

    /// Check every attach precondition without mutating anything
    ///
    /// Returns the parent's node id (`None` for the top level) so callers
    /// can reuse the resolution.
    pub(crate) fn validate_attach(
        &self,
        parent_spot: Option<SpotId>,
        child_id: &str,
    ) -> Result<Option<String>> {
        if !self.node_exists(child_id) {
            return Err(ArborError::NodeNotFound {
                node_id: child_id.to_string(),
            });
        }
        let parent_node_id = match parent_spot {
            None => None,
            Some(spot_id) => Some(self.spot(spot_id)?.node_id.clone()),
        };
        let siblings = self.child_ids_at(parent_spot)?;
        if siblings.iter().any(|id| id == child_id) {
            return Err(ArborError::DuplicateChild {
                parent_id: parent_node_id.clone().unwrap_or_default(),
                child_id: child_id.to_string(),
            });
        }
        if let Some(parent_node_id) = &parent_node_id {
            if self.subtree_contains(child_id, parent_node_id) {
                return Err(ArborError::IllegalMove {
                    parent_id: parent_node_id.clone(),
                    child_id: child_id.to_string(),
                });
            }
        }
        Ok(parent_node_id)
    }

    /// Whether `target_id` is reachable from `start_id` through the
    /// child-identity graph (including `start_id` itself)
    pub(crate) fn subtree_contains(&self, start_id: &str, target_id: &str) -> bool {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = vec![start_id];
        while let Some(id) = stack.pop() {
            if id == target_id {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get(id) {
                for child_id in &node.child_ids {
                    stack.push(child_id.as_str());
                }
            }
        }
        false
    }

    /// All node ids reachable from `start_id`, including itself
    pub(crate) fn subtree_ids(&self, start_id: &str) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut ordered: Vec<String> = Vec::new();
        let mut stack: Vec<String> = vec![start_id.to_string()];
        while let Some(id) = stack.pop() {
            if !seen.insert(id.clone()) {
                continue;
            }
            if let Some(node) = self.nodes.get(&id) {
                for child_id in node.child_ids.iter().rev() {
                    stack.push(child_id.clone());
                }
            }
            ordered.push(id);
        }
        ordered
    }

    /// Remove the parent/child edge a spot stands for
    ///
    /// The deleted node and every descendant whose last spot disappears
    /// are purged from the identity table; clones retained elsewhere
    /// survive.
    ///
    /// # Errors
    ///
    /// Returns `SpotNotFound` if the spot doesn't exist.
    pub fn delete_spot(&mut self, spot_id: SpotId) -> Result<()> {
        let spot = self.spot(spot_id)?.clone();
        match spot.parent {
            None => {
                self.top_level_ids.retain(|id| *id != spot.node_id);
            }
            Some(parent_spot) => {
                let parent_node_id = self.spot(parent_spot)?.node_id.clone();
                let parent = self.get_node_mut(&parent_node_id)?;
                if let Some(index) = parent
                    .child_ids
                    .iter()
                    .position(|id| *id == spot.node_id)
                {
                    parent.child_ids.remove(index);
                }
            }
        }
        self.refresh_spots();
        tracing::debug!(node_id = %spot.node_id, spot_id, "deleted spot");
        Ok(())
    }

    /// Merge another structure's nodes and types into this one
    ///
    /// Types are unioned by name: a type missing here is copied in, a
    /// same-named type is assumed compatible and left untouched. The
    /// source's top-level ids are spliced into the target child list at
    /// `position` (append when `None`). The caller must reassign colliding
    /// ids first; a collision aborts the merge with nothing changed.
    ///
    /// # Errors
    ///
    /// * `SpotNotFound` - the parent spot doesn't exist
    /// * `DuplicateIdentity` - a source node id already exists here
    pub fn insert_subtree(
        &mut self,
        source: TreeStructure,
        parent_spot: Option<SpotId>,
        position: Option<usize>,
    ) -> Result<()> {
        let parent_node_id = match parent_spot {
            None => None,
            Some(spot_id) => Some(self.spot(spot_id)?.node_id.clone()),
        };
        for id in source.nodes.keys() {
            if self.nodes.contains_key(id) {
                return Err(ArborError::DuplicateIdentity {
                    node_id: id.clone(),
                });
            }
        }
        for format in source.formats.iter() {
            if !self.formats.contains(&format.name) {
                self.formats.insert_or_replace(format.clone());
            }
        }
        let added = source.nodes.len();
        for (id, node) in source.nodes {
            self.nodes.insert(id, node);
        }
        match parent_node_id {
            None => {
                let index = position
                    .unwrap_or(self.top_level_ids.len())
                    .min(self.top_level_ids.len());
                self.top_level_ids
                    .splice(index..index, source.top_level_ids);
            }
            Some(parent_node_id) => {
                let parent = self.get_node_mut(&parent_node_id)?;
                let index = position
                    .unwrap_or(parent.child_ids.len())
                    .min(parent.child_ids.len());
                parent.child_ids.splice(index..index, source.top_level_ids);
            }
        }
        self.refresh_spots();
        tracing::debug!(count = added, "merged subtree");
        Ok(())
    }

    /// Mint fresh ids for any node whose id appears in `candidate_ids`
    ///
    /// Rewrites the identity table keys and every child-list reference,
    /// so a following merge can never alias two spots onto one identity.
    /// Returns the number of ids rewritten.
    pub fn reassign_duplicate_ids(&mut self, candidate_ids: &HashSet<String>) -> usize {
        let colliding: Vec<String> = self
            .nodes
            .keys()
            .filter(|id| candidate_ids.contains(*id))
            .cloned()
            .collect();
        if colliding.is_empty() {
            return 0;
        }
        let renames: HashMap<String, String> = colliding
            .iter()
            .map(|old| (old.clone(), Uuid::now_v7().to_string()))
            .collect();
        let mut renamed_nodes: HashMap<String, TreeNode> = HashMap::new();
        for (id, mut node) in self.nodes.drain() {
            let new_id = renames.get(&id).cloned().unwrap_or(id);
            node.uid = new_id.clone();
            for child_id in &mut node.child_ids {
                if let Some(new_child) = renames.get(child_id) {
                    *child_id = new_child.clone();
                }
            }
            renamed_nodes.insert(new_id, node);
        }
        self.nodes = renamed_nodes;
        for id in &mut self.top_level_ids {
            if let Some(new_id) = renames.get(id) {
                *id = new_id.clone();
            }
        }
        self.refresh_spots();
        tracing::debug!(count = renames.len(), "reassigned duplicate node ids");
        renames.len()
    }

    /// Count the live nodes of a type
    pub fn nodes_of_type(&self, type_name: &str) -> usize {
        self.nodes
            .values()
            .filter(|node| node.format_name == type_name)
            .count()
    }

    /// Swap in an edited format set and rewrite live node data to match
    ///
    /// Type renames update each affected node's type reference; field
    /// renames rewrite its data keys so stored values survive the rename.
    /// Nothing is changed if a deleted type still has live nodes.
    ///
    /// # Errors
    ///
    /// Returns `TypeInUse` if a removed type still has nodes.
    pub fn apply_format_changes(&mut self, changes: FormatChanges) -> Result<()> {
        for type_name in &changes.removed_types {
            let node_count = self.nodes_of_type(type_name);
            if node_count > 0 {
                return Err(ArborError::TypeInUse {
                    type_name: type_name.clone(),
                    node_count,
                });
            }
        }
        let type_renames: HashMap<&String, &String> = changes
            .type_renames
            .iter()
            .map(|(old, new)| (old, new))
            .collect();
        for node in self.nodes.values_mut() {
            let checkout_name = node.format_name.clone();
            if let Some(field_renames) = changes.field_renames.get(&checkout_name) {
                for (old_field, new_field) in field_renames {
                    if let Some(value) = node.data.remove(old_field) {
                        node.data.insert(new_field.clone(), value);
                    }
                }
            }
            if let Some(new_name) = type_renames.get(&checkout_name) {
                node.format_name = (*new_name).clone();
            }
        }
        self.formats = FormatRegistry::from_map(changes.formats);
        tracing::debug!(
            renamed_types = changes.type_renames.len(),
            removed_types = changes.removed_types.len(),
            "applied format changes"
        );
        Ok(())
    }
}
