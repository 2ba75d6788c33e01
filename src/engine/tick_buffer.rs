//! Tick Buffer
//!
//! Append-only, time-ordered store of incoming ticks per symbol; the
//! foundation everything downstream reads from. Ingestion enforces a
//! configurable skew policy: a tick older than the latest accepted tick
//! minus `max_skew` is rejected (default skew is zero, i.e. strict
//! non-decreasing timestamps). A late tick inside the skew window is
//! inserted at its sorted position; equal timestamps keep arrival order.
//!
//! Retention is bounded by a trim policy (max count and/or max age).
//! Trimmed ticks are unrecoverable here; durable storage is the
//! persistence collaborator's job.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

use crate::domain::Tick;

/// Ingestion-time errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    /// Tick timestamp is more than `max_skew` behind the latest accepted tick
    #[error("out-of-order tick for {symbol}: {timestamp} is behind latest {latest}")]
    OutOfOrder {
        symbol: String,
        timestamp: DateTime<Utc>,
        latest: DateTime<Utc>,
    },

    /// Tick failed basic validation (non-positive price, NaN, empty symbol)
    #[error("invalid tick for '{symbol}': price={price}, quantity={quantity}")]
    InvalidTick {
        symbol: String,
        price: f64,
        quantity: f64,
    },
}

/// Memory-bounding retention policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimPolicy {
    /// Keep at most this many ticks per symbol
    pub max_count: Option<usize>,
    /// Drop ticks older than this relative to the latest accepted tick
    pub max_age: Option<Duration>,
}

impl Default for TrimPolicy {
    fn default() -> Self {
        // The dashboard only ever consumes the most recent history
        Self {
            max_count: Some(10_000),
            max_age: None,
        }
    }
}

impl TrimPolicy {
    pub fn unbounded() -> Self {
        Self {
            max_count: None,
            max_age: None,
        }
    }

    pub fn max_count(count: usize) -> Self {
        Self {
            max_count: Some(count),
            max_age: None,
        }
    }

    pub fn max_age(age: Duration) -> Self {
        Self {
            max_count: None,
            max_age: Some(age),
        }
    }
}

/// Append-only per-symbol tick store
#[derive(Debug, Clone)]
pub struct TickBuffer {
    ticks: HashMap<String, Vec<Tick>>,
    max_skew: Duration,
    trim: TrimPolicy,
}

impl Default for TickBuffer {
    fn default() -> Self {
        Self::new(Duration::zero(), TrimPolicy::default())
    }
}

impl TickBuffer {
    pub fn new(max_skew: Duration, trim: TrimPolicy) -> Self {
        Self {
            ticks: HashMap::new(),
            max_skew,
            trim,
        }
    }

    /// Append a tick in timestamp order.
    ///
    /// Rejects ticks staler than the skew bound; ingestion continues after a
    /// rejection, the caller logs and drops the tick.
    pub fn append(&mut self, tick: Tick) -> Result<(), IngestError> {
        if !tick.is_valid() {
            return Err(IngestError::InvalidTick {
                symbol: tick.symbol.clone(),
                price: tick.price,
                quantity: tick.quantity,
            });
        }

        let series = self.ticks.entry(tick.symbol.clone()).or_default();

        if let Some(latest) = series.last().map(|t| t.timestamp) {
            if tick.timestamp < latest - self.max_skew {
                return Err(IngestError::OutOfOrder {
                    symbol: tick.symbol,
                    timestamp: tick.timestamp,
                    latest,
                });
            }
            if tick.timestamp < latest {
                // Small revision within the skew window: insert in order,
                // after any existing tick with the same timestamp
                let pos = series.partition_point(|t| t.timestamp <= tick.timestamp);
                warn!(
                    symbol = %series[0].symbol,
                    "late tick within skew window, inserting at position {}",
                    pos
                );
                series.insert(pos, tick);
                self.trim_symbol_by_policy();
                return Ok(());
            }
        }

        series.push(tick);
        self.trim_symbol_by_policy();
        Ok(())
    }

    fn trim_symbol_by_policy(&mut self) {
        for series in self.ticks.values_mut() {
            if let Some(max) = self.trim.max_count {
                if series.len() > max {
                    series.drain(..series.len() - max);
                }
            }
            if let Some(age) = self.trim.max_age {
                if let Some(latest) = series.last().map(|t| t.timestamp) {
                    let cutoff = latest - age;
                    let keep_from = series.partition_point(|t| t.timestamp < cutoff);
                    if keep_from > 0 {
                        series.drain(..keep_from);
                    }
                }
            }
        }
    }

    /// Lazy range query: ticks for `symbol` with `from_ts <= t < to_ts`,
    /// in timestamp order. Restartable; never materializes the whole buffer.
    pub fn query<'a>(
        &'a self,
        symbol: &str,
        from_ts: DateTime<Utc>,
        to_ts: DateTime<Utc>,
    ) -> impl Iterator<Item = &'a Tick> + 'a {
        let series = self.ticks.get(symbol).map(Vec::as_slice).unwrap_or(&[]);
        let start = series.partition_point(|t| t.timestamp < from_ts);
        series[start..]
            .iter()
            .take_while(move |t| t.timestamp < to_ts)
    }

    /// All buffered ticks for a symbol, oldest first
    pub fn all<'a>(&'a self, symbol: &str) -> impl Iterator<Item = &'a Tick> + 'a {
        self.ticks.get(symbol).map(Vec::as_slice).unwrap_or(&[]).iter()
    }

    /// Latest accepted timestamp for a symbol
    pub fn latest_timestamp(&self, symbol: &str) -> Option<DateTime<Utc>> {
        self.ticks.get(symbol)?.last().map(|t| t.timestamp)
    }

    pub fn len(&self, symbol: &str) -> usize {
        self.ticks.get(symbol).map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.values().all(Vec::is_empty)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.ticks.keys().map(String::as_str)
    }
}
