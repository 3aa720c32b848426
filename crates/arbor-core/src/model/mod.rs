//! Core data model for arbor
//!
//! Contains the node identity type and the spot (tree position) type.
//! A node carries the data; spots place that data in the tree. A node
//! referenced from several parents (a clone) owns one spot per placement.

pub mod node;
pub mod spot;

pub use node::TreeNode;
pub use spot::{Spot, SpotId};
