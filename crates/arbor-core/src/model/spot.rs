/// Identifier for a spot, minted sequentially by the owning structure
pub type SpotId = u64;

/// Spot - a single tree position displaying a node
///
/// A spot pairs a node id with the spot of its parent placement, `None` for
/// a top-level position. A node placed under two parents (or twice under
/// one parent) owns two spots; spot identity is what distinguishes the two
/// appearances of a clone.
///
/// Spots are runtime bookkeeping. They are rebuilt from the child id lists
/// after structural changes and never written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spot {
    /// This spot's id
    pub id: SpotId,

    /// Id of the node displayed at this position
    pub node_id: String,

    /// Parent placement, `None` for top-level spots
    pub parent: Option<SpotId>,
}

impl Spot {
    /// Create a new spot placing `node_id` under the given parent spot
    pub fn new(id: SpotId, node_id: String, parent: Option<SpotId>) -> Self {
        Self {
            id,
            node_id,
            parent,
        }
    }

    /// Check if this spot is a top-level position
    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_spot() {
        let spot = Spot::new(1, "node-1".to_string(), None);
        assert!(spot.is_top_level());
    }

    #[test]
    fn test_child_spot_keeps_parent_link() {
        let spot = Spot::new(2, "node-2".to_string(), Some(1));
        assert!(!spot.is_top_level());
        assert_eq!(spot.parent, Some(1));
    }
}
