//! CLI parse: clap types for Gatehouse. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Gatehouse CLI - request queue with deferred auto-approval
#[derive(Parser)]
#[command(name = "gatehouse")]
#[command(about = "Access-control request queue with deferred auto-approval")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configuration commands (show, validate)
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Run a deterministic queue simulation on a manual clock
    Simulate {
        /// Normal-priority requests to submit
        #[arg(long, default_value = "5")]
        normal: usize,
        /// High-priority requests to submit
        #[arg(long, default_value = "1")]
        high: usize,
        /// Urgent-priority requests to submit
        #[arg(long, default_value = "1")]
        urgent: usize,
        /// Simulated run length in seconds
        #[arg(long, default_value = "120")]
        duration_secs: u64,
        /// Seconds between dashboard refreshes
        #[arg(long, default_value = "5")]
        tick_secs: u64,
        /// Make every k-th Normal request's commit decline
        #[arg(long)]
        fail_every: Option<usize>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Validate the effective configuration
    Validate,
}
