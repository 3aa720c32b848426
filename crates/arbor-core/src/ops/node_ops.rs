use std::collections::HashSet;

use uuid::Uuid;

use super::store::TreeStructure;
use crate::errors::{ArborError, Result};
use crate::format::DEFAULT_TYPE_NAME;
use crate::model::{SpotId, TreeNode};
use crate::undo::UndoCommand;

/// Create a new node under a parent spot (or at the top level)
///
/// The node's type is `type_name` when given, otherwise the parent
/// format's child-type hint, otherwise the parent's own type; top-level
/// nodes fall back to the document's default type. Field initial defaults
/// are filled in on the fresh node.
///
/// # Arguments
/// * `structure` - Mutable reference to the document structure
/// * `parent_spot` - Parent position, `None` for the top level
/// * `position` - Index in the child list, `None` to append
/// * `type_name` - Explicit type for the new node, `None` to infer
///
/// # Returns
/// The ID of the newly created node
///
/// # Errors
/// * `SpotNotFound` - If the parent spot doesn't exist
/// * `TypeNotFound` - If the chosen type is not registered
pub fn new_child(
    structure: &mut TreeStructure,
    parent_spot: Option<SpotId>,
    position: Option<usize>,
    type_name: Option<&str>,
) -> Result<String> {
    let parent_node_id = match parent_spot {
        None => None,
        Some(spot_id) => Some(structure.spot(spot_id)?.node_id.clone()),
    };
    let chosen_type = match type_name {
        Some(name) => name.to_string(),
        None => infer_child_type(structure, parent_node_id.as_deref())?,
    };
    let format = structure.formats.require(&chosen_type)?;

    let node_id = Uuid::now_v7().to_string();
    let mut node = TreeNode::new(node_id.clone(), chosen_type);
    format.set_init_default_data(&mut node.data, false);

    let command =
        UndoCommand::capture_child_lists(structure, &[parent_node_id], &[node_id.clone()]);
    structure.undo_log.record(command);
    structure.insert_node(node);
    structure.attach_child(parent_spot, &node_id, position)?;
    tracing::debug!(node_id = %node_id, "created node");
    Ok(node_id)
}

fn infer_child_type(structure: &TreeStructure, parent_node_id: Option<&str>) -> Result<String> {
    match parent_node_id {
        Some(parent_id) => {
            let parent = structure.get_node(parent_id)?;
            let parent_format = structure.formats.require(&parent.format_name)?;
            if !parent_format.child_type_hint.is_empty()
                && structure.formats.contains(&parent_format.child_type_hint)
            {
                Ok(parent_format.child_type_hint.clone())
            } else {
                Ok(parent.format_name.clone())
            }
        }
        None => structure
            .formats
            .default_type_name()
            .ok_or_else(|| ArborError::TypeNotFound {
                type_name: DEFAULT_TYPE_NAME.to_string(),
            }),
    }
}

/// Attach an existing node under a second parent, creating a clone
///
/// The node keeps a single identity: edits to its fields are visible from
/// every spot, and both positions share the whole subtree.
///
/// # Errors
/// * `NodeNotFound` / `SpotNotFound` - If node or parent don't exist
/// * `DuplicateChild` - If the parent already holds this node
/// * `IllegalMove` - If the attach would make the node its own ancestor
pub fn add_clone(
    structure: &mut TreeStructure,
    node_id: &str,
    parent_spot: Option<SpotId>,
    position: Option<usize>,
) -> Result<SpotId> {
    let parent_node_id = structure.validate_attach(parent_spot, node_id)?;
    let command = UndoCommand::capture_child_lists(structure, &[parent_node_id], &[]);
    structure.undo_log.record(command);
    structure.attach_child(parent_spot, node_id, position)
}

/// Move one placement to a new parent or to a new position
///
/// Only the given placement moves; a cloned node's other placements stay
/// where they are, and the node's identity and subtree ride along
/// untouched. `position` indexes the destination child list after the
/// placement has left its old slot, `None` appends. Returns the
/// placement's spot id at its new position.
///
/// # Errors
/// * `SpotNotFound` - If the spot or the target parent doesn't exist
/// * `DuplicateChild` - If the target parent already holds this node
/// * `IllegalMove` - If the move would make the node its own ancestor
pub fn move_spot(
    structure: &mut TreeStructure,
    spot_id: SpotId,
    new_parent_spot: Option<SpotId>,
    position: Option<usize>,
) -> Result<SpotId> {
    let spot = structure.spot(spot_id)?.clone();
    let old_parent_node_id = match spot.parent {
        None => None,
        Some(parent_spot) => Some(structure.spot(parent_spot)?.node_id.clone()),
    };
    let new_parent_node_id = match new_parent_spot {
        None => None,
        Some(parent_spot) => Some(structure.spot(parent_spot)?.node_id.clone()),
    };
    let mut parent_ids = vec![old_parent_node_id.clone()];
    if new_parent_node_id != old_parent_node_id {
        structure.validate_attach(new_parent_spot, &spot.node_id)?;
        parent_ids.push(new_parent_node_id);
    }
    let command = UndoCommand::capture_child_lists(structure, &parent_ids, &[]);
    structure.undo_log.record(command);
    structure.move_child(spot_id, new_parent_spot, position)
}

/// Set one field value on a node
///
/// The field must be declared by the node's type; the value is passed
/// through the field capability so numeric fields stay canonical.
///
/// # Errors
/// * `NodeNotFound` - If the node doesn't exist
/// * `TypeNotFound` - If the node's type is not registered
/// * `FieldNotFound` - If the type doesn't declare the field
/// * `InvalidFieldValue` - If the value fails the field's parse rules
pub fn set_field_value(
    structure: &mut TreeStructure,
    node_id: &str,
    field_name: &str,
    value: &str,
) -> Result<()> {
    let node = structure.get_node(node_id)?;
    let format = structure.formats.require(&node.format_name)?;
    let field = format
        .field(field_name)
        .ok_or_else(|| ArborError::FieldNotFound {
            type_name: format.name.clone(),
            field_name: field_name.to_string(),
        })?;
    let stored = field.parse_from_title(value)?;

    let command = UndoCommand::capture_data(structure, &[node_id.to_string()]);
    structure.undo_log.record(command);
    structure
        .get_node_mut(node_id)?
        .set_field_text(field_name, &stored);
    Ok(())
}

/// Rename a node by inverse-matching a typed title against its type's
/// title template
///
/// Nothing changes unless the whole title parses; a mismatch leaves the
/// node untouched.
///
/// # Errors
/// * `NodeNotFound` / `TypeNotFound` - If node or type don't exist
/// * `TitleParseMismatch` - If the title doesn't fit the template
/// * `InvalidFieldValue` - If a captured value fails its field's parse
pub fn set_title(structure: &mut TreeStructure, node_id: &str, title: &str) -> Result<()> {
    let node = structure.get_node(node_id)?;
    let format = structure.formats.require(&node.format_name)?;
    let pairs = format.extract_title_data(title)?;

    let command = UndoCommand::capture_data(structure, &[node_id.to_string()]);
    structure.undo_log.record(command);
    let node = structure.get_node_mut(node_id)?;
    for (field_name, value) in pairs {
        node.set_field_text(&field_name, &value);
    }
    Ok(())
}

/// Change a node's type, filling in the new type's initial defaults for
/// fields the node doesn't populate yet
///
/// # Errors
/// * `NodeNotFound` - If the node doesn't exist
/// * `TypeNotFound` - If the target type is not registered
pub fn change_node_type(
    structure: &mut TreeStructure,
    node_id: &str,
    type_name: &str,
) -> Result<()> {
    structure.get_node(node_id)?;
    let format = structure.formats.require(type_name)?.clone();

    let command = UndoCommand::capture_data(structure, &[node_id.to_string()]);
    structure.undo_log.record(command);
    let node = structure.get_node_mut(node_id)?;
    node.format_name = type_name.to_string();
    format.set_init_default_data(&mut node.data, false);
    tracing::debug!(node_id = %node_id, type_name = %type_name, "changed node type");
    Ok(())
}

/// Delete one spot, purging exclusively-owned descendants
///
/// # Errors
///
/// Returns `SpotNotFound` if the spot doesn't exist.
pub fn delete_spot(structure: &mut TreeStructure, spot_id: SpotId) -> Result<()> {
    let spot = structure.spot(spot_id)?.clone();
    let parent_node_id = match spot.parent {
        None => None,
        Some(parent_spot) => Some(structure.spot(parent_spot)?.node_id.clone()),
    };
    let tracked = structure.subtree_ids(&spot.node_id);
    let command = UndoCommand::capture_child_lists(structure, &[parent_node_id], &tracked);
    structure.undo_log.record(command);
    structure.delete_spot(spot_id)
}

/// Delete a batch of spots as one undoable step
///
/// Spots that vanish while the batch runs (a descendant of an earlier
/// deletion, or an id that never existed) are skipped, not errors.
/// Returns the number of spots actually deleted.
pub fn delete_spots(structure: &mut TreeStructure, spot_ids: &[SpotId]) -> Result<usize> {
    let mut parent_ids: Vec<Option<String>> = Vec::new();
    let mut seen_parents: HashSet<Option<String>> = HashSet::new();
    let mut tracked: Vec<String> = Vec::new();
    let mut tracked_set: HashSet<String> = HashSet::new();
    for &spot_id in spot_ids {
        let Ok(spot) = structure.spot(spot_id) else {
            continue;
        };
        let parent_node_id = match spot.parent {
            None => None,
            Some(parent_spot) => Some(structure.spot(parent_spot)?.node_id.clone()),
        };
        if seen_parents.insert(parent_node_id.clone()) {
            parent_ids.push(parent_node_id);
        }
        for id in structure.subtree_ids(&spot.node_id) {
            if tracked_set.insert(id.clone()) {
                tracked.push(id);
            }
        }
    }
    if parent_ids.is_empty() {
        return Ok(0);
    }
    let command = UndoCommand::capture_child_lists(structure, &parent_ids, &tracked);
    structure.undo_log.record(command);
    let mut deleted = 0;
    for &spot_id in spot_ids {
        if structure.spot_exists(spot_id) {
            structure.delete_spot(spot_id)?;
            deleted += 1;
        } else {
            tracing::debug!(spot_id, "skipped vanished spot");
        }
    }
    Ok(deleted)
}

/// Copy a spot's branch into a standalone structure
///
/// The copy carries the branch's nodes and the types they use; it is the
/// source shape for clipboard-style paste.
///
/// # Errors
///
/// Returns `SpotNotFound` if the spot doesn't exist.
pub fn copy_branch(structure: &TreeStructure, spot_id: SpotId) -> Result<TreeStructure> {
    let spot = structure.spot(spot_id)?;
    let mut copy = TreeStructure::new();
    let mut used_types: HashSet<String> = HashSet::new();
    for id in structure.subtree_ids(&spot.node_id) {
        let node = structure.get_node(&id)?;
        used_types.insert(node.format_name.clone());
        copy.insert_node(node.clone());
    }
    for type_name in used_types {
        if let Ok(format) = structure.formats.require(&type_name) {
            copy.formats.insert_or_replace(format.clone());
        }
    }
    copy.top_level_ids.push(spot.node_id.clone());
    copy.refresh_spots();
    Ok(copy)
}

/// Paste a copied structure under a parent spot
///
/// Source ids colliding with live ids are reassigned first, so pasting a
/// branch next to its original never aliases identities.
///
/// # Errors
/// * `SpotNotFound` - If the parent spot doesn't exist
/// * `DuplicateIdentity` - If reassignment is somehow bypassed
pub fn paste_branch(
    structure: &mut TreeStructure,
    mut source: TreeStructure,
    parent_spot: Option<SpotId>,
    position: Option<usize>,
) -> Result<()> {
    let parent_node_id = match parent_spot {
        None => None,
        Some(spot_id) => Some(structure.spot(spot_id)?.node_id.clone()),
    };
    let live_ids: HashSet<String> = structure.nodes.keys().cloned().collect();
    source.reassign_duplicate_ids(&live_ids);
    let tracked: Vec<String> = source.nodes.keys().cloned().collect();
    let command = UndoCommand::capture_child_lists(structure, &[parent_node_id], &tracked);
    structure.undo_log.record(command);
    structure.insert_subtree(source, parent_spot, position)
}
