pub mod format_ops;
pub mod node_ops;
pub mod store;

pub use store::TreeStructure;
