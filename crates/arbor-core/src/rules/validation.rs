use super::invariants;
use crate::errors::{ArborError, Result};
use crate::ops::TreeStructure;

/// Validate the child-identity graph alone, before spots exist
///
/// This is the load-time gate: a document whose graph fails here must be
/// rejected wholesale rather than partially imported.
///
/// # Errors
///
/// Returns the first violation found: `ChildRefUnknown`, `DuplicateChild`,
/// `IllegalMove` for a cycle edge, or `OrphanLeak` for an unreachable
/// node.
pub fn validate_graph(structure: &TreeStructure) -> Result<()> {
    if let Some((parent_id, child_id)) = invariants::find_unknown_child_refs(structure).first() {
        return Err(ArborError::ChildRefUnknown {
            parent_id: display_parent(parent_id.as_deref()),
            child_id: child_id.clone(),
        });
    }
    if let Some((parent_id, child_id)) = invariants::find_duplicate_children(structure).first() {
        return Err(ArborError::DuplicateChild {
            parent_id: display_parent(parent_id.as_deref()),
            child_id: child_id.clone(),
        });
    }
    if let Some((parent_id, child_id)) = invariants::find_cycle_edges(structure).first() {
        return Err(ArborError::IllegalMove {
            parent_id: parent_id.clone(),
            child_id: child_id.clone(),
        });
    }
    if let Some(node_id) = invariants::find_unreachable_nodes(structure).first() {
        return Err(ArborError::OrphanLeak {
            node_id: node_id.clone(),
        });
    }
    Ok(())
}

/// Validate the whole structure, the derived spot view included
///
/// # Errors
///
/// Returns the first violation found; graph checks run before spot
/// checks, with a spotless node reported as `OrphanLeak` and a spot-table
/// disagreement as `Internal`.
pub fn validate_structure(structure: &TreeStructure) -> Result<()> {
    validate_graph(structure)?;
    if let Some(node_id) = invariants::find_spotless_nodes(structure).first() {
        return Err(ArborError::OrphanLeak {
            node_id: node_id.clone(),
        });
    }
    if let Some((spot_id, node_id)) = invariants::find_spot_mismatches(structure).first() {
        return Err(ArborError::Internal {
            message: format!("spot {spot_id} disagrees with node {node_id}"),
        });
    }
    Ok(())
}

fn display_parent(parent_id: Option<&str>) -> String {
    parent_id.unwrap_or("top level").to_string()
}
