//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// flagforge challenge-site compiler CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Source root directory (where groups and challenges live)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: flagforge.toml)
    #[arg(short = 'C', long, default_value = "flagforge.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Apply directives and output a single challenge
    Compile {
        /// Path to the challenge source directory (e.g. pipeline/)
        source: PathBuf,

        /// Output root directory; the challenge is written to <output>/<name>/
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Discover and compile every challenge, then generate the homepage
    CompileAll {
        /// Output root directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Serve a challenge with live directive processing
    Serve {
        /// Path to the challenge source directory
        source: PathBuf,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,
    },
}
