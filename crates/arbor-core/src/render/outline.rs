use crate::errors::Result;
use crate::model::SpotId;
use crate::ops::TreeStructure;

/// Render the single-line title for the node at a spot
///
/// # Arguments
/// * `structure` - Reference to the TreeStructure
/// * `spot_id` - Spot whose node is rendered
///
/// # Returns
/// The title text
///
/// # Errors
/// * `SpotNotFound` / `NodeNotFound` - If the spot or its node is missing
/// * `TypeNotFound` - If the node's type is not registered
pub fn render_title(structure: &TreeStructure, spot_id: SpotId) -> Result<String> {
    let spot = structure.spot(spot_id)?;
    let node = structure.get_node(&spot.node_id)?;
    let format = structure.formats.require(&node.format_name)?;
    Ok(format.render_title(node))
}

/// Render the output lines for the node at a spot, without its children
///
/// Blank lines are suppressed the same way branch rendering suppresses
/// them.
///
/// # Errors
/// * `SpotNotFound` / `NodeNotFound` - If the spot or its node is missing
/// * `TypeNotFound` - If the node's type is not registered
pub fn render_output(
    structure: &TreeStructure,
    spot_id: SpotId,
    plain_text: bool,
) -> Result<Vec<String>> {
    let spot = structure.spot(spot_id)?;
    let node = structure.get_node(&spot.node_id)?;
    let format = structure.formats.require(&node.format_name)?;
    Ok(format.render_output(node, plain_text, false))
}

/// Render a branch as display lines
///
/// Each node contributes its output lines with its children's lines
/// nested directly below. Runs of consecutive same-type siblings are
/// wrapped in the type's sibling prefix/suffix (skipped in plain-text
/// mode), and types with `space_between` set get a blank line between
/// adjacent sibling outputs.
///
/// # Arguments
/// * `structure` - Reference to the TreeStructure
/// * `spot_id` - Root spot of the branch
/// * `plain_text` - Strip markup and skip sibling wrapping
///
/// # Returns
/// The assembled display lines
///
/// # Errors
/// * `SpotNotFound` / `NodeNotFound` - If a spot or node is missing
/// * `TypeNotFound` - If a node's type is not registered
pub fn render_branch(
    structure: &TreeStructure,
    spot_id: SpotId,
    plain_text: bool,
) -> Result<Vec<String>> {
    render_spot_group(structure, &[spot_id], plain_text)
}

/// Render the whole document: every top-level branch in order
///
/// # Errors
/// Same as [`render_branch`]
pub fn render_document(structure: &TreeStructure, plain_text: bool) -> Result<Vec<String>> {
    let top_ids: Vec<SpotId> = structure.top_spots().iter().map(|spot| spot.id).collect();
    render_spot_group(structure, &top_ids, plain_text)
}

/// Render a branch as an indented title outline, one node per line
///
/// # Errors
/// * `SpotNotFound` / `NodeNotFound` - If a spot or node is missing
/// * `TypeNotFound` - If a node's type is not registered
pub fn outline_branch(structure: &TreeStructure, spot_id: SpotId) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    push_outline_lines(structure, spot_id, 0, &mut lines)?;
    Ok(lines)
}

/// Render the whole document as an indented title outline
///
/// # Errors
/// Same as [`outline_branch`]
pub fn outline_document(structure: &TreeStructure) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    let top_ids: Vec<SpotId> = structure.top_spots().iter().map(|spot| spot.id).collect();
    for spot_id in top_ids {
        push_outline_lines(structure, spot_id, 0, &mut lines)?;
    }
    Ok(lines)
}

/// One sibling's contribution to a group: its own output plus its
/// nested children, tagged with its type for run grouping
struct SiblingBlock {
    format_name: String,
    lines: Vec<String>,
}

fn render_spot_group(
    structure: &TreeStructure,
    spot_ids: &[SpotId],
    plain_text: bool,
) -> Result<Vec<String>> {
    let mut blocks = Vec::new();
    for &spot_id in spot_ids {
        let spot = structure.spot(spot_id)?;
        let node = structure.get_node(&spot.node_id)?;
        let format = structure.formats.require(&node.format_name)?;
        let mut lines = format.render_output(node, plain_text, false);
        let child_ids: Vec<SpotId> = structure
            .child_spots(spot_id)?
            .iter()
            .map(|child| child.id)
            .collect();
        if !child_ids.is_empty() {
            lines.extend(render_spot_group(structure, &child_ids, plain_text)?);
        }
        blocks.push(SiblingBlock {
            format_name: node.format_name.clone(),
            lines,
        });
    }

    // Group consecutive same-type blocks into runs, wrap each run, and
    // separate spaced outputs with blank lines.
    let mut out: Vec<String> = Vec::new();
    let mut previous_spacing = false;
    let mut index = 0;
    while index < blocks.len() {
        let format_name = blocks[index].format_name.clone();
        let mut run_end = index;
        while run_end < blocks.len() && blocks[run_end].format_name == format_name {
            run_end += 1;
        }
        let format = structure.formats.require(&format_name)?;

        let mut run_lines: Vec<String> = Vec::new();
        for block in &mut blocks[index..run_end] {
            if block.lines.is_empty() {
                continue;
            }
            if !run_lines.is_empty() && format.space_between {
                run_lines.push(String::new());
            }
            run_lines.append(&mut block.lines);
        }

        if !run_lines.is_empty() {
            if !plain_text {
                if !format.sibling_prefix.is_empty() {
                    if let Some(first) = run_lines.first_mut() {
                        first.insert_str(0, &format.sibling_prefix);
                    }
                }
                if !format.sibling_suffix.is_empty() {
                    if let Some(last) = run_lines.last_mut() {
                        last.push_str(&format.sibling_suffix);
                    }
                }
            }
            if !out.is_empty() && previous_spacing {
                out.push(String::new());
            }
            out.extend(run_lines);
            previous_spacing = format.space_between;
        }
        index = run_end;
    }
    Ok(out)
}

fn push_outline_lines(
    structure: &TreeStructure,
    spot_id: SpotId,
    depth: usize,
    lines: &mut Vec<String>,
) -> Result<()> {
    let spot = structure.spot(spot_id)?;
    let node = structure.get_node(&spot.node_id)?;
    let format = structure.formats.require(&node.format_name)?;
    lines.push(format!("{}{}", "  ".repeat(depth), format.render_title(node)));
    let child_ids: Vec<SpotId> = structure
        .child_spots(spot_id)?
        .iter()
        .map(|child| child.id)
        .collect();
    for child_id in child_ids {
        push_outline_lines(structure, child_id, depth + 1, lines)?;
    }
    Ok(())
}
