//! CLI Adapter
//!
//! Command-line interface for the quantdash analytics engine.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{AnalyzeCmd, CliApp, Command, RunCmd};
