//! CLI layer for interview-coach.
//!
//! Provides the command-line interface using clap, with commands for
//! serving the chat UI and managing the document index.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
