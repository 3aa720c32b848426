//! Arbor Core - Outline document engine
//!
//! This crate provides the data structures and operations for arbor
//! documents, including:
//! - Node types with compiled title/output templates and typed fields
//! - A tree structure where one node identity can hold several positions
//!   (clones) with referential integrity across all of them
//! - Structural edit operations with full undo/redo
//! - A scratch/commit cycle for reworking type definitions safely
//! - Structural invariant validation
//! - Sibling-aware output rendering and indented title outlines
//! - JSON document persistence with all-or-nothing loading

pub mod errors;
pub mod format;
pub mod logging;
pub mod model;
pub mod ops;
pub mod persist;
pub mod render;
pub mod rules;
pub mod undo;

// Re-export commonly used types
pub use errors::{ArborError, Result};
pub use format::{FieldDef, FieldKind, FieldTemplate, FormatRegistry, NodeFormat};
pub use model::{Spot, SpotId, TreeNode};
pub use ops::TreeStructure;
pub use undo::{UndoCommand, UndoLog};
