//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};

use crate::context::Edition;

/// devbench - workstation environment manager for the two-edition server.
#[derive(Parser, Debug)]
#[command(name = "devbench")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Skip tests during builds. Bare flag implies true.
    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub skip_tests: Option<bool>,

    /// Override a context property (section.key=value). Repeatable.
    #[arg(long = "set", global = true, value_name = "SECTION.KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prepare the server installation and check out both source trees.
    Init,

    /// Show the resolved context.
    Ctx,

    /// Source-control operations over both editions.
    Src {
        /// Source-control subcommand.
        #[command(subcommand)]
        command: SrcCommands,
    },

    /// Build the source trees.
    Build {
        /// Build a single directory of one edition instead of everything.
        #[arg(long, requires = "edition")]
        dir: Option<String>,

        /// Edition of the targeted directory build.
        #[arg(long, value_enum)]
        edition: Option<Edition>,
    },

    /// Application-server operations.
    Server {
        /// Server subcommand.
        #[command(subcommand)]
        command: ServerCommands,
    },
}

/// Source-control subcommands.
#[derive(Subcommand, Debug)]
pub enum SrcCommands {
    /// Check out both editions.
    Checkout,

    /// Update both working copies.
    Update,

    /// Show working-copy status.
    Status,

    /// Show local modifications.
    Diff,

    /// Revert local modifications recursively.
    Revert,
}

/// Application-server subcommands.
#[derive(Subcommand, Debug)]
pub enum ServerCommands {
    /// Start the server.
    Start,

    /// Stop the server.
    Stop,

    /// Restart the server.
    Restart,

    /// Deploy the webapp, or one module's jar with --dir.
    Deploy {
        /// Deploy a single module's built jar instead of the full webapp.
        #[arg(long, requires = "edition")]
        dir: Option<String>,

        /// Edition of the targeted module.
        #[arg(long, value_enum)]
        edition: Option<Edition>,
    },

    /// Show running server instances.
    Status,

    /// Open the deployed application in the browser.
    Go,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}
