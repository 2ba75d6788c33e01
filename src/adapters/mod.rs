//! Adapters Layer - Implementations of the port traits
//!
//! - `replay`: recorded and synthetic tick feeds
//! - `csv_import`: offline OHLC rows bypassing the tick pipeline
//! - `cli`: clap argument definitions for the binary

pub mod cli;
pub mod csv_import;
pub mod replay;

pub use csv_import::{load_bars, parse_bars, CsvImportError};
pub use replay::{ReplayFeed, SyntheticFeed};
