use std::collections::{HashMap, HashSet};

use crate::model::SpotId;
use crate::ops::TreeStructure;

/// Find nodes surviving in the identity table with zero spots
///
/// Returns sorted node ids. Any hit means a deletion path failed to purge
/// synchronously.
pub fn find_spotless_nodes(structure: &TreeStructure) -> Vec<String> {
    let mut ids: Vec<String> = structure
        .nodes
        .values()
        .filter(|node| node.spot_ids.is_empty())
        .map(|node| node.uid.clone())
        .collect();
    ids.sort();
    ids
}

/// Find nodes not reachable from the top-level list through the
/// child-identity graph
///
/// Returns sorted node ids.
pub fn find_unreachable_nodes(structure: &TreeStructure) -> Vec<String> {
    let mut reachable: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = structure
        .top_level_ids
        .iter()
        .map(String::as_str)
        .collect();
    while let Some(id) = stack.pop() {
        if !reachable.insert(id) {
            continue;
        }
        if let Some(node) = structure.nodes.get(id) {
            for child_id in &node.child_ids {
                stack.push(child_id.as_str());
            }
        }
    }
    let mut ids: Vec<String> = structure
        .nodes
        .keys()
        .filter(|id| !reachable.contains(id.as_str()))
        .cloned()
        .collect();
    ids.sort();
    ids
}

/// Find child-list entries naming ids missing from the identity table
///
/// Returns sorted (parent id, child id) tuples; a `None` parent is the
/// top-level list.
pub fn find_unknown_child_refs(structure: &TreeStructure) -> Vec<(Option<String>, String)> {
    let mut refs: Vec<(Option<String>, String)> = Vec::new();
    for child_id in &structure.top_level_ids {
        if !structure.nodes.contains_key(child_id) {
            refs.push((None, child_id.clone()));
        }
    }
    for node in structure.nodes.values() {
        for child_id in &node.child_ids {
            if !structure.nodes.contains_key(child_id) {
                refs.push((Some(node.uid.clone()), child_id.clone()));
            }
        }
    }
    refs.sort();
    refs
}

/// Find ids listed twice in one child list
///
/// Returns sorted (parent id, child id) tuples; a `None` parent is the
/// top-level list.
pub fn find_duplicate_children(structure: &TreeStructure) -> Vec<(Option<String>, String)> {
    let mut duplicates: Vec<(Option<String>, String)> = Vec::new();
    collect_duplicates(&mut duplicates, None, &structure.top_level_ids);
    for node in structure.nodes.values() {
        collect_duplicates(&mut duplicates, Some(node.uid.clone()), &node.child_ids);
    }
    duplicates.sort();
    duplicates
}

fn collect_duplicates(
    duplicates: &mut Vec<(Option<String>, String)>,
    parent_id: Option<String>,
    child_ids: &[String],
) {
    let mut seen: HashSet<&str> = HashSet::new();
    for child_id in child_ids {
        if !seen.insert(child_id.as_str()) {
            duplicates.push((parent_id.clone(), child_id.clone()));
        }
    }
}

/// Find child edges that close a cycle in the identity graph
///
/// Uses an iterative DFS with an on-path set. Returns sorted
/// (parent id, child id) tuples, one per back edge found.
pub fn find_cycle_edges(structure: &TreeStructure) -> Vec<(String, String)> {
    let mut edges: Vec<(String, String)> = Vec::new();
    let mut finished: HashSet<String> = HashSet::new();
    let mut roots: Vec<String> = structure.top_level_ids.clone();
    // cycles disconnected from the top are still cycles
    let mut all_ids: Vec<String> = structure.nodes.keys().cloned().collect();
    all_ids.sort();
    roots.extend(all_ids);

    for root in roots {
        if finished.contains(&root) || !structure.nodes.contains_key(&root) {
            continue;
        }
        let mut on_path: HashSet<String> = HashSet::new();
        // (node, next child index) pairs form the explicit DFS stack
        let mut stack: Vec<(String, usize)> = vec![(root.clone(), 0)];
        on_path.insert(root);
        while let Some((id, child_index)) = stack.pop() {
            let child = structure
                .nodes
                .get(&id)
                .and_then(|node| node.child_ids.get(child_index).cloned());
            match child {
                Some(child_id) => {
                    stack.push((id.clone(), child_index + 1));
                    if on_path.contains(&child_id) {
                        edges.push((id, child_id));
                    } else if !finished.contains(&child_id)
                        && structure.nodes.contains_key(&child_id)
                    {
                        on_path.insert(child_id.clone());
                        stack.push((child_id, 0));
                    }
                }
                None => {
                    on_path.remove(&id);
                    finished.insert(id);
                }
            }
        }
    }
    edges.sort();
    edges.dedup();
    edges
}

/// Find disagreements between the spot table and the node spot sets
///
/// Returns sorted (spot id, node id) tuples covering spots that point at
/// missing nodes or parents, nodes claiming spots the table doesn't have,
/// and table spots a node doesn't claim.
pub fn find_spot_mismatches(structure: &TreeStructure) -> Vec<(SpotId, String)> {
    let mut mismatches: Vec<(SpotId, String)> = Vec::new();
    let mut claimed: HashMap<SpotId, &str> = HashMap::new();
    for node in structure.nodes.values() {
        for &spot_id in &node.spot_ids {
            claimed.insert(spot_id, node.uid.as_str());
            match structure.spots.get(&spot_id) {
                Some(spot) if spot.node_id == node.uid => {}
                _ => mismatches.push((spot_id, node.uid.clone())),
            }
        }
    }
    for spot in structure.spots.values() {
        if !structure.nodes.contains_key(&spot.node_id) {
            mismatches.push((spot.id, spot.node_id.clone()));
            continue;
        }
        if claimed.get(&spot.id) != Some(&spot.node_id.as_str()) {
            mismatches.push((spot.id, spot.node_id.clone()));
        }
        if let Some(parent_id) = spot.parent {
            if !structure.spots.contains_key(&parent_id) {
                mismatches.push((spot.id, spot.node_id.clone()));
            }
        }
    }
    mismatches.sort();
    mismatches.dedup();
    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TreeNode;

    fn raw_structure() -> TreeStructure {
        let mut structure = TreeStructure::new();
        for uid in ["r", "x", "y"] {
            structure.insert_node(TreeNode::new(uid.to_string(), "T".to_string()));
        }
        structure.get_node_mut("r").unwrap().child_ids = vec!["x".into(), "y".into()];
        structure.top_level_ids.push("r".to_string());
        structure
    }

    #[test]
    fn test_clean_structure_has_no_findings() {
        let mut structure = raw_structure();
        structure.refresh_spots();
        assert!(find_spotless_nodes(&structure).is_empty());
        assert!(find_unreachable_nodes(&structure).is_empty());
        assert!(find_unknown_child_refs(&structure).is_empty());
        assert!(find_duplicate_children(&structure).is_empty());
        assert!(find_cycle_edges(&structure).is_empty());
        assert!(find_spot_mismatches(&structure).is_empty());
    }

    #[test]
    fn test_find_unreachable_and_spotless() {
        let mut structure = raw_structure();
        structure.refresh_spots();
        structure.insert_node(TreeNode::new("island".to_string(), "T".to_string()));
        assert_eq!(find_unreachable_nodes(&structure), vec!["island"]);
        assert_eq!(find_spotless_nodes(&structure), vec!["island"]);
    }

    #[test]
    fn test_find_unknown_child_refs() {
        let mut structure = raw_structure();
        structure
            .get_node_mut("y")
            .unwrap()
            .child_ids
            .push("ghost".to_string());
        structure.top_level_ids.push("phantom".to_string());
        let refs = find_unknown_child_refs(&structure);
        assert_eq!(
            refs,
            vec![
                (None, "phantom".to_string()),
                (Some("y".to_string()), "ghost".to_string()),
            ]
        );
    }

    #[test]
    fn test_find_duplicate_children() {
        let mut structure = raw_structure();
        structure
            .get_node_mut("r")
            .unwrap()
            .child_ids
            .push("x".to_string());
        assert_eq!(
            find_duplicate_children(&structure),
            vec![(Some("r".to_string()), "x".to_string())]
        );
    }

    #[test]
    fn test_find_cycle_edges() {
        let mut structure = raw_structure();
        structure
            .get_node_mut("x")
            .unwrap()
            .child_ids
            .push("r".to_string());
        assert_eq!(
            find_cycle_edges(&structure),
            vec![("x".to_string(), "r".to_string())]
        );
    }

    #[test]
    fn test_find_spot_mismatches() {
        let mut structure = raw_structure();
        structure.refresh_spots();
        // claim a spot the table never minted
        structure.get_node_mut("y").unwrap().spot_ids.insert(999);
        let mismatches = find_spot_mismatches(&structure);
        assert_eq!(mismatches, vec![(999, "y".to_string())]);
    }
}
