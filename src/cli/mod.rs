//! CLI module for the devbench tool.
//!
//! This module provides the command-line interface for managing the local
//! development environment.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat, ServerCommands, SrcCommands};
pub use output::OutputFormatter;
