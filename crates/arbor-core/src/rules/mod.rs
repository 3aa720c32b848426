//! Structural invariant checks
//!
//! This module audits a tree structure for violations of its invariants:
//! every child reference resolves, no parent lists a child twice, no node
//! is its own ancestor, every node is reachable and placed, and the spot
//! table agrees with the nodes that claim its entries.
//!
//! `invariants` holds the individual finders, each returning every
//! violation of one kind. `validation` folds them into a first-error
//! gate used before accepting a loaded document and after mutation
//! batches in tests.

pub mod invariants;
pub mod validation;

pub use validation::{validate_graph, validate_structure};
