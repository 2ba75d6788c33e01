//! Offline OHLC import.
//!
//! Reads pre-built OHLC rows from a CSV file, bypassing the tick buffer and
//! resampler, for when live data is unavailable. The schema matches `Bar`'s
//! fields exactly:
//!
//! interval_start,open,high,low,close,volume
//!
//! `interval_start` is epoch seconds or RFC 3339. A header row is detected
//! and skipped.

use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;
use thiserror::Error;

use crate::domain::{Bar, Resolution};

/// CSV import errors
#[derive(Debug, Error)]
pub enum CsvImportError {
    #[error("Failed to read CSV file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Line {line}: expected 6 fields, got {got}")]
    FieldCount { line: usize, got: usize },

    #[error("Line {line}: invalid {field}: '{value}'")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("Line {line}: OHLC invariant violated (low <= open,close <= high)")]
    InvalidBar { line: usize },
}

/// Load OHLC bars from a CSV file, oldest first
pub fn load_bars(
    path: impl AsRef<Path>,
    symbol: &str,
    resolution: Resolution,
) -> Result<Vec<Bar>, CsvImportError> {
    let content = std::fs::read_to_string(path)?;
    parse_bars(&content, symbol, resolution)
}

/// Parse OHLC rows from CSV text
pub fn parse_bars(
    content: &str,
    symbol: &str,
    resolution: Resolution,
) -> Result<Vec<Bar>, CsvImportError> {
    let mut bars = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        if idx == 0 && trimmed.to_lowercase().starts_with("interval_start") {
            continue;
        }

        let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        if fields.len() != 6 {
            return Err(CsvImportError::FieldCount {
                line,
                got: fields.len(),
            });
        }

        let interval_start = parse_timestamp(fields[0]).ok_or(CsvImportError::InvalidField {
            line,
            field: "interval_start",
            value: fields[0].to_string(),
        })?;

        let mut values = [0.0f64; 5];
        let names = ["open", "high", "low", "close", "volume"];
        for (i, (&field, &name)) in fields[1..].iter().zip(names.iter()).enumerate() {
            values[i] = field.parse().map_err(|_| CsvImportError::InvalidField {
                line,
                field: name,
                value: field.to_string(),
            })?;
        }
        let [open, high, low, close, volume] = values;

        let bar = Bar {
            symbol: symbol.to_string(),
            resolution,
            interval_start,
            interval_end: interval_start + chrono::Duration::seconds(resolution.seconds()),
            open,
            high,
            low,
            close,
            volume,
        };
        if !bar.is_valid() {
            return Err(CsvImportError::InvalidBar { line });
        }
        bars.push(bar);
    }

    Ok(bars)
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(secs) = value.parse::<i64>() {
        return Utc.timestamp_opt(secs, 0).single();
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
