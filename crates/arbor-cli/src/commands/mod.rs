//! CLI subcommand implementations

pub mod check;
pub mod new;
pub mod outline;
pub mod render;
