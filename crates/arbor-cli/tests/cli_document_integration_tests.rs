//! CLI document integration tests
//!
//! These tests verify that the CLI commands create, render, and validate
//! document files end to end through the persistence layer.

use std::fs;
use std::process::Command;
use tempfile::TempDir;

use arbor_core::ops::{node_ops, TreeStructure};
use arbor_core::persist;

fn cli_bin() -> &'static str {
    env!("CARGO_BIN_EXE_arbor")
}

#[test]
fn test_cli_new_then_outline() {
    // Scenario: create a document, then print its outline
    // When: `arbor new doc.json` followed by `arbor outline doc.json`
    // Then: both succeed and the outline shows the default root title

    let temp_dir = TempDir::new().unwrap();
    let doc_path = temp_dir.path().join("doc.json");

    let output = Command::new(cli_bin())
        .args(["new", doc_path.to_str().unwrap()])
        .output()
        .expect("Failed to execute CLI");
    assert!(
        output.status.success(),
        "new should succeed. Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(doc_path.exists());

    let output = Command::new(cli_bin())
        .args(["outline", doc_path.to_str().unwrap()])
        .output()
        .expect("Failed to execute CLI");
    assert!(
        output.status.success(),
        "outline should succeed. Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "Main");
}

#[test]
fn test_cli_new_refuses_overwrite_without_force() {
    let temp_dir = TempDir::new().unwrap();
    let doc_path = temp_dir.path().join("doc.json");

    let output = Command::new(cli_bin())
        .args(["new", doc_path.to_str().unwrap()])
        .output()
        .expect("Failed to execute CLI");
    assert!(output.status.success());

    let output = Command::new(cli_bin())
        .args(["new", doc_path.to_str().unwrap()])
        .output()
        .expect("Failed to execute CLI");
    assert!(!output.status.success(), "second new should fail");
    assert!(String::from_utf8_lossy(&output.stderr).contains("already exists"));

    let output = Command::new(cli_bin())
        .args(["new", doc_path.to_str().unwrap(), "--force"])
        .output()
        .expect("Failed to execute CLI");
    assert!(output.status.success(), "--force should overwrite");
}

#[test]
fn test_cli_render_seeded_document() {
    // Scenario: render a document seeded through the core API
    // When: a document with one child is saved, then `arbor render --plain`
    // Then: stdout holds the root and child output lines in order

    let temp_dir = TempDir::new().unwrap();
    let doc_path = temp_dir.path().join("doc.json");

    let mut structure = TreeStructure::with_defaults();
    let root_spot = structure.top_spots()[0].id;
    let child_id = node_ops::new_child(&mut structure, Some(root_spot), None, None).unwrap();
    node_ops::set_field_value(&mut structure, &child_id, "Name", "Apples").unwrap();
    persist::save_file(&structure, &doc_path).unwrap();

    let output = Command::new(cli_bin())
        .args(["render", doc_path.to_str().unwrap(), "--plain"])
        .output()
        .expect("Failed to execute CLI");
    assert!(
        output.status.success(),
        "render should succeed. Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout, "Main\nApples\n");
}

#[test]
fn test_cli_render_to_output_file() {
    let temp_dir = TempDir::new().unwrap();
    let doc_path = temp_dir.path().join("doc.json");
    let out_path = temp_dir.path().join("out.txt");

    let structure = TreeStructure::with_defaults();
    persist::save_file(&structure, &doc_path).unwrap();

    let output = Command::new(cli_bin())
        .args([
            "render",
            doc_path.to_str().unwrap(),
            "--output",
            out_path.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute CLI");
    assert!(
        output.status.success(),
        "render should succeed. Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(fs::read_to_string(&out_path).unwrap(), "Main\n");
}

#[test]
fn test_cli_check_reports_counts() {
    let temp_dir = TempDir::new().unwrap();
    let doc_path = temp_dir.path().join("doc.json");

    let output = Command::new(cli_bin())
        .args(["new", doc_path.to_str().unwrap()])
        .output()
        .expect("Failed to execute CLI");
    assert!(output.status.success());

    let output = Command::new(cli_bin())
        .args(["check", doc_path.to_str().unwrap()])
        .output()
        .expect("Failed to execute CLI");
    assert!(
        output.status.success(),
        "check should succeed. Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 nodes"));
    assert!(stdout.contains("1 spots"));
}

#[test]
fn test_cli_check_rejects_broken_document() {
    // Scenario: a document whose child reference points nowhere
    // When: `arbor check broken.json`
    // Then: nonzero exit with the broken reference named on stderr

    let temp_dir = TempDir::new().unwrap();
    let doc_path = temp_dir.path().join("broken.json");
    let broken = r#"{
        "formats": [{"formatname": "T", "fields": [], "titleline": "", "outputlines": [""]}],
        "nodes": [{"uid": "n1", "format": "T", "children": ["ghost"]}],
        "properties": {"tlversion": "1.0", "topnodes": ["n1"]}
    }"#;
    fs::write(&doc_path, broken).unwrap();

    let output = Command::new(cli_bin())
        .args(["check", doc_path.to_str().unwrap()])
        .output()
        .expect("Failed to execute CLI");
    assert!(!output.status.success(), "check should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("unknown child"),
        "stderr should name the broken reference: {}",
        stderr
    );
}
