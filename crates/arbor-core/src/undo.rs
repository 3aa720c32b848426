//! Undo and redo history
//!
//! History is two plain command stacks holding inverse-applicable deltas.
//! Every mutating operation records a command capturing the state it is
//! about to change; applying an undo first captures the matching inverse
//! from the live structure and pushes it onto the redo stack, so undo and
//! redo stay strictly alternating without any outside bookkeeping.

use std::collections::HashMap;

use crate::errors::{ArborError, Result};
use crate::format::FormatRegistry;
use crate::model::TreeNode;
use crate::ops::TreeStructure;

/// Number of undo steps kept before the oldest is dropped
pub const DEFAULT_UNDO_LIMIT: usize = 100;

/// Snapshot of one node's editable data and type assignment
#[derive(Debug, Clone)]
pub struct DataEntry {
    pub node_id: String,
    pub format_name: String,
    pub data: HashMap<String, String>,
}

/// Snapshot of one parent's child-identity list; `None` is the top level
#[derive(Debug, Clone)]
pub struct ChildListEntry {
    pub parent_id: Option<String>,
    pub child_ids: Vec<String>,
}

/// One inverse-applicable delta
#[derive(Debug, Clone)]
pub enum UndoCommand {
    /// Field data and type assignment of a set of nodes
    Data { entries: Vec<DataEntry> },
    /// Child lists of a set of parents, plus snapshots of the nodes whose
    /// identities those lists keep alive
    ///
    /// `tracked_ids` fixes the set of nodes whose existence may toggle
    /// when the lists swap; `node_snapshots` holds the tracked nodes that
    /// existed at capture time so an undo can re-seed the identity table.
    ChildList {
        entries: Vec<ChildListEntry>,
        tracked_ids: Vec<String>,
        node_snapshots: Vec<TreeNode>,
    },
    /// The whole format registry plus the node data it governs
    Formats {
        registry: FormatRegistry,
        entries: Vec<DataEntry>,
    },
}

impl UndoCommand {
    /// Capture the current data state of the given nodes
    ///
    /// Ids not present in the structure are skipped.
    pub fn capture_data(structure: &TreeStructure, node_ids: &[String]) -> UndoCommand {
        UndoCommand::Data {
            entries: data_entries(structure, node_ids),
        }
    }

    /// Capture the current child lists of the given parents along with
    /// snapshots of every tracked node that currently exists
    pub fn capture_child_lists(
        structure: &TreeStructure,
        parent_ids: &[Option<String>],
        tracked_ids: &[String],
    ) -> UndoCommand {
        let entries = parent_ids
            .iter()
            .map(|parent_id| ChildListEntry {
                parent_id: parent_id.clone(),
                child_ids: match parent_id {
                    None => structure.top_level_ids.clone(),
                    Some(id) => structure
                        .get_node(id)
                        .map(|node| node.child_ids.clone())
                        .unwrap_or_default(),
                },
            })
            .collect();
        let node_snapshots = tracked_ids
            .iter()
            .filter_map(|id| structure.get_node(id).ok().cloned())
            .collect();
        UndoCommand::ChildList {
            entries,
            tracked_ids: tracked_ids.to_vec(),
            node_snapshots,
        }
    }

    /// Capture the current format registry and the data of the given nodes
    pub fn capture_formats(structure: &TreeStructure, node_ids: &[String]) -> UndoCommand {
        UndoCommand::Formats {
            registry: structure.formats.clone(),
            entries: data_entries(structure, node_ids),
        }
    }

    /// Capture the inverse of this command from the live structure
    fn capture_inverse(&self, structure: &TreeStructure) -> UndoCommand {
        match self {
            UndoCommand::Data { entries } => {
                UndoCommand::capture_data(structure, &entry_ids(entries))
            }
            UndoCommand::ChildList {
                entries,
                tracked_ids,
                ..
            } => {
                let parent_ids: Vec<Option<String>> = entries
                    .iter()
                    .map(|entry| entry.parent_id.clone())
                    .collect();
                UndoCommand::capture_child_lists(structure, &parent_ids, tracked_ids)
            }
            UndoCommand::Formats { entries, .. } => {
                UndoCommand::capture_formats(structure, &entry_ids(entries))
            }
        }
    }

    /// Restore the captured state
    ///
    /// Entries naming nodes that no longer exist are skipped; applying a
    /// child-list command re-seeds tracked identities before swapping the
    /// lists, then rebuilds spots so orphan purging runs as usual.
    fn apply(&self, structure: &mut TreeStructure) {
        match self {
            UndoCommand::Data { entries } => {
                apply_data_entries(structure, entries);
            }
            UndoCommand::ChildList {
                entries,
                node_snapshots,
                ..
            } => {
                for snapshot in node_snapshots {
                    structure.insert_node(snapshot.clone());
                }
                for entry in entries {
                    match &entry.parent_id {
                        None => {
                            structure.top_level_ids = entry.child_ids.clone();
                        }
                        Some(parent_id) => match structure.get_node_mut(parent_id) {
                            Ok(parent) => parent.child_ids = entry.child_ids.clone(),
                            Err(_) => {
                                tracing::warn!(node_id = %parent_id, "undo parent vanished");
                            }
                        },
                    }
                }
                structure.refresh_spots();
            }
            UndoCommand::Formats { registry, entries } => {
                structure.formats = registry.clone();
                apply_data_entries(structure, entries);
            }
        }
    }
}

fn entry_ids(entries: &[DataEntry]) -> Vec<String> {
    entries.iter().map(|entry| entry.node_id.clone()).collect()
}

fn data_entries(structure: &TreeStructure, node_ids: &[String]) -> Vec<DataEntry> {
    node_ids
        .iter()
        .filter_map(|id| {
            structure.get_node(id).ok().map(|node| DataEntry {
                node_id: id.clone(),
                format_name: node.format_name.clone(),
                data: node.data.clone(),
            })
        })
        .collect()
}

fn apply_data_entries(structure: &mut TreeStructure, entries: &[DataEntry]) {
    for entry in entries {
        match structure.get_node_mut(&entry.node_id) {
            Ok(node) => {
                node.format_name = entry.format_name.clone();
                node.data = entry.data.clone();
            }
            Err(_) => {
                tracing::warn!(node_id = %entry.node_id, "undo target vanished");
            }
        }
    }
}

/// The undo and redo stacks of one document
#[derive(Debug, Clone)]
pub struct UndoLog {
    undo_stack: Vec<UndoCommand>,
    redo_stack: Vec<UndoCommand>,
    limit: usize,
}

impl Default for UndoLog {
    fn default() -> Self {
        UndoLog::new(DEFAULT_UNDO_LIMIT)
    }
}

impl UndoLog {
    pub fn new(limit: usize) -> UndoLog {
        UndoLog {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit,
        }
    }

    /// Record a fresh edit
    ///
    /// A new edit invalidates the redo stack; the oldest step is dropped
    /// once the limit is reached.
    pub fn record(&mut self, command: UndoCommand) {
        self.undo_stack.push(command);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.limit {
            self.undo_stack.remove(0);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Drop all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn pop_undo(&mut self) -> Option<UndoCommand> {
        self.undo_stack.pop()
    }

    fn pop_redo(&mut self) -> Option<UndoCommand> {
        self.redo_stack.pop()
    }

    fn push_undo_raw(&mut self, command: UndoCommand) {
        self.undo_stack.push(command);
    }

    fn push_redo_raw(&mut self, command: UndoCommand) {
        self.redo_stack.push(command);
    }
}

/// Revert the most recent recorded edit
///
/// # Errors
///
/// Returns `NothingToUndo` if the undo stack is empty.
pub fn undo(structure: &mut TreeStructure) -> Result<()> {
    let command = structure
        .undo_log
        .pop_undo()
        .ok_or(ArborError::NothingToUndo)?;
    let inverse = command.capture_inverse(structure);
    command.apply(structure);
    structure.undo_log.push_redo_raw(inverse);
    tracing::debug!("applied undo step");
    Ok(())
}

/// Reapply the most recently undone edit
///
/// # Errors
///
/// Returns `NothingToRedo` if the redo stack is empty.
pub fn redo(structure: &mut TreeStructure) -> Result<()> {
    let command = structure
        .undo_log
        .pop_redo()
        .ok_or(ArborError::NothingToRedo)?;
    let inverse = command.capture_inverse(structure);
    command.apply(structure);
    structure.undo_log.push_undo_raw(inverse);
    tracing::debug!("applied redo step");
    Ok(())
}
