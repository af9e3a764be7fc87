//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Lakestack - declarative stack deployment for workspace resources.
#[derive(Parser, Debug)]
#[command(name = "lakestack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy every resource declared in a stack configuration.
    Deploy {
        /// Path to the stack configuration file.
        config: PathBuf,

        /// Allow replacing existing remote content.
        #[arg(short, long)]
        overwrite: bool,
    },

    /// Download deployed workspace objects back to their local sources.
    Download {
        /// Path to the stack configuration file.
        config: PathBuf,

        /// Allow replacing existing local files.
        #[arg(short, long)]
        overwrite: bool,
    },

    /// Validate a stack configuration without deploying.
    Validate {
        /// Path to the stack configuration file.
        config: PathBuf,
    },
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
