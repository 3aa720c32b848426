//! New document command
//!
//! Usage: arbor new <FILE> [--force]

use clap::Args;
use std::path::PathBuf;

use arbor_core::ops::TreeStructure;
use arbor_core::persist;

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Path for the new document file
    pub file: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Execute new command
pub fn execute(args: NewArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.file.exists() && !args.force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            args.file.display()
        )
        .into());
    }

    let structure = TreeStructure::with_defaults();
    persist::save_file(&structure, &args.file)?;

    println!("✓ Created {}", args.file.display());
    Ok(())
}
