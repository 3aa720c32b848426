//! Render command
//!
//! Usage: arbor render <FILE> [--plain] [--output <FILE>]

use clap::Args;
use std::path::PathBuf;

use arbor_core::persist;
use arbor_core::render;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Document file to read
    pub file: PathBuf,

    /// Strip markup and skip sibling wrapping
    #[arg(long)]
    pub plain: bool,

    /// Output file path (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute render command
pub fn execute(args: RenderArgs) -> Result<(), Box<dyn std::error::Error>> {
    let structure = persist::load_file(&args.file)?;
    let lines = render::render_document(&structure, args.plain)?;
    let text = if lines.is_empty() {
        String::new()
    } else {
        lines.join("\n") + "\n"
    };

    if let Some(output_path) = args.output {
        std::fs::write(&output_path, text)?;
        println!("✓ Rendered to {}", output_path.display());
    } else {
        print!("{}", text);
    }

    Ok(())
}
