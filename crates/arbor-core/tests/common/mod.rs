use arbor_core::format::{FieldDef, FieldKind, NodeFormat};
use arbor_core::ops::{node_ops, TreeStructure};
use arbor_core::render;
use arbor_core::SpotId;

/// Create a structure with the default type and a "Main" root node
#[allow(dead_code)]
pub fn new_structure() -> TreeStructure {
    TreeStructure::with_defaults()
}

/// The root node's single top-level spot
#[allow(dead_code)]
pub fn root_spot(structure: &TreeStructure) -> SpotId {
    structure.top_spots()[0].id
}

/// Register the grocery "Item" type used across suites: Name and Qty
/// fields, `{*Name*}` title, `{*Name*}: {*Qty*}` output line
#[allow(dead_code)]
pub fn add_item_type(structure: &mut TreeStructure) {
    let mut format = NodeFormat::new("Item");
    format
        .add_field(FieldDef::new("Name", FieldKind::Text))
        .unwrap();
    format
        .add_field(FieldDef::new("Qty", FieldKind::Number))
        .unwrap();
    format.change_title_line("{*Name*}");
    format.change_output_lines(&["{*Name*}: {*Qty*}".to_string()], false);
    structure.formats.insert(format).unwrap();
}

/// Add an Item child under the given spot, returning its node id
#[allow(dead_code)]
pub fn add_item(
    structure: &mut TreeStructure,
    parent_spot: SpotId,
    name: &str,
    qty: &str,
) -> String {
    let id = node_ops::new_child(structure, Some(parent_spot), None, Some("Item")).unwrap();
    node_ops::set_field_value(structure, &id, "Name", name).unwrap();
    node_ops::set_field_value(structure, &id, "Qty", qty).unwrap();
    id
}

/// Titles of the children under a spot, in child-list order
#[allow(dead_code)]
pub fn child_titles(structure: &TreeStructure, spot: SpotId) -> Vec<String> {
    structure
        .child_spots(spot)
        .unwrap()
        .iter()
        .map(|child| render::render_title(structure, child.id).unwrap())
        .collect()
}

/// The single spot a node holds; panics if the node is cloned
#[allow(dead_code)]
pub fn only_spot(structure: &TreeStructure, node_id: &str) -> SpotId {
    let spots = structure.spots_for_node(node_id);
    assert_eq!(spots.len(), 1, "expected exactly one spot for {}", node_id);
    spots[0].id
}
