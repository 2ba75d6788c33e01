//! Pair Spread
//!
//! spread_t = priceA_t - beta * priceB_t over timestamp-aligned closes.
//! The series is rebuilt whenever beta updates; beta itself only updates
//! when its source window advances (once per computation cycle), so the
//! spread never churns per tick.

use chrono::{DateTime, Utc};

use super::rolling::{self, zscore};
use super::StatError;

/// Derived sequence of (timestamp, spread_value)
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadSeries {
    pub beta: f64,
    pub points: Vec<(DateTime<Utc>, f64)>,
}

impl SpreadSeries {
    /// Build the spread from two timestamped close series and a hedge ratio.
    /// Unaligned timestamps are dropped pairwise.
    pub fn build(
        a: &[(DateTime<Utc>, f64)],
        b: &[(DateTime<Utc>, f64)],
        beta: f64,
    ) -> Self {
        let points = rolling::align(a, b)
            .into_iter()
            .map(|(ts, pa, pb)| (ts, pa - beta * pb))
            .collect();
        Self { beta, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Raw spread values, oldest first
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    /// Z-score of the latest spread value against the last `window` values
    pub fn zscore(&self, window: usize) -> Result<f64, StatError> {
        let values = self.values();
        StatError::check_len(values.len(), window.max(2))?;
        let tail = &values[values.len() - window.max(2)..];
        zscore(tail)
    }
}
