//! CLI parse: clap types for bulletin. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bulletin CLI - learn a reference layout and publish a validated weekly bulletin
#[derive(Parser, Debug)]
#[command(name = "bulletin")]
#[command(about = "Two-stage generative pipeline producing a validated HTML bulletin")]
pub struct Cli {
    /// Command to run (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Workspace root directory
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Only log errors
    #[arg(long, global = true, default_value = "false", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output includes a file)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Acceptance policy once retries are exhausted (best-effort, strict)
    #[arg(long, global = true)]
    pub policy: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Probe, learn, synthesize, validate and persist (default)
    Run,
    /// Check the credential and make one round trip to the service
    Probe,
    /// Validate a saved document offline
    Validate {
        /// Document to check
        path: PathBuf,
    },
}

impl Cli {
    /// The command to execute, `run` when none was given
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }
}
