//! Arbor CLI
//!
//! Command-line interface for arbor outline documents

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "arbor")]
#[command(about = "Arbor - Outline document management", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a new document with a default root node
    New(commands::new::NewArgs),
    /// Print a document as an indented title outline
    Outline(commands::outline::OutlineArgs),
    /// Render a document's formatted output
    Render(commands::render::RenderArgs),
    /// Validate a document's structure
    Check(commands::check::CheckArgs),
}

fn main() {
    arbor_core::logging::init(arbor_core::logging::Profile::Production);
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::New(args) => commands::new::execute(args),
        Commands::Outline(args) => commands::outline::execute(args),
        Commands::Render(args) => commands::render::execute(args),
        Commands::Check(args) => commands::check::execute(args),
    };

    if let Err(error) = outcome {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}
