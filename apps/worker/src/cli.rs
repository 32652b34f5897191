use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Periodically probes stored checks and alerts owners when a check changes state
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Config file, created with defaults when missing
    #[arg(short, long, env = "CHECKWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the probing and rotation loops until interrupted (default)
    Run,
    /// Run a single probing pass and wait for every pipeline to finish
    Tick,
    /// Rotate every live outcome log once
    Rotate,
    /// Print the contents of an archived outcome log
    Decompress { archive_id: String },
    /// Print the effective configuration
    Config,
}
