//! Outline command
//!
//! Usage: arbor outline <FILE>

use clap::Args;
use std::path::PathBuf;

use arbor_core::persist;
use arbor_core::render;

#[derive(Debug, Args)]
pub struct OutlineArgs {
    /// Document file to read
    pub file: PathBuf,
}

/// Execute outline command
pub fn execute(args: OutlineArgs) -> Result<(), Box<dyn std::error::Error>> {
    let structure = persist::load_file(&args.file)?;

    for line in render::outline_document(&structure)? {
        println!("{}", line);
    }

    Ok(())
}
