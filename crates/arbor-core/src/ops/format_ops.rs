use std::collections::HashSet;

use super::store::TreeStructure;
use crate::errors::{ArborError, Result};
use crate::format::FormatScratch;
use crate::undo::UndoCommand;

/// Clone the live format registry into a scratch copy for editing
///
/// Nothing touches the document until the scratch is committed with
/// [`commit_formats`]; dropping it discards every edit.
pub fn checkout_formats(structure: &TreeStructure) -> FormatScratch {
    FormatScratch::checkout(&structure.formats)
}

/// Commit a scratch edit back into the document as one undoable step
///
/// Renamed types and fields are rewritten on every live node so stored
/// data survives the rename. Deleting a type that still has nodes aborts
/// the whole commit before anything changes.
///
/// # Errors
///
/// Returns `TypeInUse` if a deleted type still has live nodes.
pub fn commit_formats(structure: &mut TreeStructure, scratch: FormatScratch) -> Result<()> {
    let changes = scratch.into_changes();
    for type_name in &changes.removed_types {
        let node_count = structure.nodes_of_type(type_name);
        if node_count > 0 {
            return Err(ArborError::TypeInUse {
                type_name: type_name.clone(),
                node_count,
            });
        }
    }
    let renamed_types: HashSet<&String> =
        changes.type_renames.iter().map(|(old, _)| old).collect();
    let affected: Vec<String> = structure
        .nodes
        .values()
        .filter(|node| {
            renamed_types.contains(&node.format_name)
                || changes.field_renames.contains_key(&node.format_name)
        })
        .map(|node| node.uid.clone())
        .collect();
    let command = UndoCommand::capture_formats(structure, &affected);
    structure.undo_log.record(command);
    structure.apply_format_changes(changes)
}
