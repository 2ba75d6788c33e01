//! CLI Command Definitions
//!
//! Argument structs for the quantdash binary. Execution lives in main.rs.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Quantdash - Streaming Pair-Trading Analytics Engine
#[derive(Parser, Debug)]
#[command(
    name = "quantdash",
    version = env!("CARGO_PKG_VERSION"),
    about = "Streaming pair-trading analytics engine",
    long_about = "Quantdash resamples a live tick stream into OHLC bars and derives \
                  rolling z-scores, correlation, hedge ratios, spread stationarity \
                  and mean-reversion signals for a symbol pair."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the live analytics loop on a synthetic demo feed
    Run(RunCmd),

    /// One-shot analytics over two offline OHLC CSV files
    Analyze(AnalyzeCmd),
}

/// Run the live analytics loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Seed for the synthetic demo feed
    #[arg(long, value_name = "SEED", default_value_t = 42)]
    pub seed: u64,

    /// Synthetic feed tick interval in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 250)]
    pub tick_interval_ms: u64,
}

/// One-shot offline analysis
#[derive(Parser, Debug)]
pub struct AnalyzeCmd {
    /// OHLC CSV for the first leg
    #[arg(value_name = "FILE_A")]
    pub file_a: PathBuf,

    /// OHLC CSV for the second leg
    #[arg(value_name = "FILE_B")]
    pub file_b: PathBuf,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Override the rolling window size
    #[arg(short, long, value_name = "N")]
    pub window: Option<usize>,

    /// Override the regression mode (ols or huber)
    #[arg(short, long, value_name = "MODE")]
    pub mode: Option<String>,
}
