//! Bullet and table decoration applied to live types, observed through
//! branch and document rendering.

mod common;

use arbor_core::format::{FieldDef, FieldKind, NodeFormat};
use arbor_core::ops::node_ops;
use arbor_core::render;

use common::{add_item, add_item_type, new_structure, root_spot};

// ===== BULLET TESTS =====

#[test]
fn test_bulleted_items_render_as_one_list() {
    let mut structure = new_structure();
    add_item_type(&mut structure);
    let root = root_spot(&structure);
    add_item(&mut structure, root, "Bread", "1");
    add_item(&mut structure, root, "Milk", "2");
    {
        let format = structure.formats.require_mut("Item").unwrap();
        format.space_between = false;
        format.apply_bullets();
    }

    let lines = render::render_branch(&structure, root, false).unwrap();
    assert_eq!(
        lines,
        vec![
            "Main",
            "<ul><li>Bread: 1</li>",
            "<li>Milk: 2</li></ul>",
        ]
    );
}

#[test]
fn test_applying_bullets_twice_changes_nothing() {
    let mut structure = new_structure();
    add_item_type(&mut structure);
    let root = root_spot(&structure);
    add_item(&mut structure, root, "Bread", "1");
    structure
        .formats
        .require_mut("Item")
        .unwrap()
        .apply_bullets();
    let once = render::render_branch(&structure, root, false).unwrap();
    let texts_once = structure.formats.require("Item").unwrap().output_texts();

    structure
        .formats
        .require_mut("Item")
        .unwrap()
        .apply_bullets();
    assert_eq!(render::render_branch(&structure, root, false).unwrap(), once);
    assert_eq!(
        structure.formats.require("Item").unwrap().output_texts(),
        texts_once
    );
}

#[test]
fn test_clearing_decoration_restores_plain_lines() {
    let mut structure = new_structure();
    add_item_type(&mut structure);
    let root = root_spot(&structure);
    add_item(&mut structure, root, "Bread", "1");

    let format = structure.formats.require_mut("Item").unwrap();
    format.apply_bullets();
    format.clear_decoration();
    assert_eq!(format.output_texts(), vec!["{*Name*}: {*Qty*}"]);
    assert!(format.sibling_prefix.is_empty());

    let lines = render::render_branch(&structure, root, false).unwrap();
    assert_eq!(lines, vec!["Main", "Bread: 1"]);
}

// ===== TABLE TESTS =====

#[test]
fn test_table_document_renders_header_and_rows() {
    let mut structure = new_structure();
    add_item_type(&mut structure);
    let main_spot = root_spot(&structure);
    {
        let format = structure.formats.require_mut("Item").unwrap();
        format.space_between = false;
        format.change_output_lines(
            &["Name: {*Name*}".to_string(), "Qty: {*Qty*}".to_string()],
            false,
        );
        format.apply_tables();
    }
    for (name, qty) in [("Bread", "1"), ("Milk", "2")] {
        let id = node_ops::new_child(&mut structure, None, None, Some("Item")).unwrap();
        node_ops::set_field_value(&mut structure, &id, "Name", name).unwrap();
        node_ops::set_field_value(&mut structure, &id, "Qty", qty).unwrap();
    }
    node_ops::delete_spot(&mut structure, main_spot).unwrap();

    let lines = render::render_document(&structure, false).unwrap();
    assert_eq!(
        lines,
        vec![
            "<table border=\"1\" cellpadding=\"3\"><tr><th>Name</th><th>Qty</th></tr><tr><td>Bread</td>",
            "<td>1</td></tr>",
            "<tr><td>Milk</td>",
            "<td>2</td></tr></table>",
        ]
    );
}

#[test]
fn test_table_decoration_without_headings_skips_header_row() {
    let mut structure = new_structure();
    add_item_type(&mut structure);
    let format = structure.formats.require_mut("Item").unwrap();
    format.apply_tables();
    assert_eq!(
        format.sibling_prefix,
        "<table border=\"1\" cellpadding=\"3\">"
    );
    assert_eq!(format.output_texts(), vec!["<tr><td>{*Name*}: {*Qty*}</td></tr>"]);
}

// ===== ESCAPE AND STRIP TESTS =====

#[test]
fn test_html_values_strip_for_plain_render() {
    let mut structure = new_structure();
    let mut recipe = NodeFormat::new("Recipe");
    recipe.add_field(FieldDef::new("Title", FieldKind::Text)).unwrap();
    recipe.add_field(FieldDef::new("Body", FieldKind::HtmlText)).unwrap();
    recipe.change_title_line("{*Title*}");
    recipe.change_output_lines(&["{*Body*}".to_string()], false);
    recipe.format_html = true;
    structure.formats.insert(recipe).unwrap();

    let root = root_spot(&structure);
    let id = node_ops::new_child(&mut structure, Some(root), None, Some("Recipe")).unwrap();
    node_ops::set_field_value(&mut structure, &id, "Title", "Sourdough").unwrap();
    node_ops::set_field_value(&mut structure, &id, "Body", "<b>Crusty</b> loaf").unwrap();
    let spot = structure.child_spots(root).unwrap()[0].id;

    assert_eq!(
        render::render_output(&structure, spot, false).unwrap(),
        vec!["<b>Crusty</b> loaf"]
    );
    assert_eq!(
        render::render_output(&structure, spot, true).unwrap(),
        vec!["Crusty loaf"]
    );
}

#[test]
fn test_plain_values_escape_for_markup_render() {
    let mut structure = new_structure();
    let root_id = structure.top_level_ids[0].clone();
    node_ops::set_field_value(&mut structure, &root_id, "Name", "Rye & Wheat").unwrap();
    let root = root_spot(&structure);

    assert_eq!(
        render::render_output(&structure, root, false).unwrap(),
        vec!["Rye &amp; Wheat"]
    );
    assert_eq!(
        render::render_output(&structure, root, true).unwrap(),
        vec!["Rye & Wheat"]
    );
    assert_eq!(
        render::render_title(&structure, root).unwrap(),
        "Rye & Wheat"
    );
}
