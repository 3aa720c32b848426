//! Check command
//!
//! Usage: arbor check <FILE>

use clap::Args;
use std::path::PathBuf;

use arbor_core::persist;
use arbor_core::rules;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Document file to validate
    pub file: PathBuf,
}

/// Execute check command
pub fn execute(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let structure = persist::load_file(&args.file)?;
    rules::validate_structure(&structure)?;

    println!(
        "✓ {} ok: {} nodes, {} spots, {} types",
        args.file.display(),
        structure.node_count(),
        structure.spot_count(),
        structure.formats.len()
    );
    Ok(())
}
