//! Formatted output assembly
//!
//! Turns a structure's spot tree into display text: each node renders
//! through its type's output templates, runs of same-type siblings are
//! wrapped in the type's sibling markup, and a plain indented title
//! outline is available for quick inspection.

pub mod outline;

pub use outline::{
    outline_branch, outline_document, render_branch, render_document, render_output, render_title,
};
