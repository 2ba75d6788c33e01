//! Trade Tick
//!
//! A single trade observation delivered by the exchange connector.
//! Immutable once recorded; ticks for a symbol are ordered by timestamp
//! and duplicate timestamps are permitted (multiple trades in one instant).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single trade tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Trade time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Instrument symbol, e.g. "btcusdt"
    pub symbol: String,
    /// Trade price, strictly positive
    pub price: f64,
    /// Trade quantity, non-negative
    pub quantity: f64,
}

impl Tick {
    pub fn new(timestamp: DateTime<Utc>, symbol: impl Into<String>, price: f64, quantity: f64) -> Self {
        Self {
            timestamp,
            symbol: symbol.into(),
            price,
            quantity,
        }
    }

    /// Check the tick carries usable data
    pub fn is_valid(&self) -> bool {
        self.price > 0.0
            && self.price.is_finite()
            && self.quantity >= 0.0
            && self.quantity.is_finite()
            && !self.symbol.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_valid_tick() {
        let tick = Tick::new(ts(1_700_000_000), "btcusdt", 42_000.5, 0.25);
        assert!(tick.is_valid());
    }

    #[test]
    fn test_invalid_price() {
        let zero = Tick::new(ts(0), "btcusdt", 0.0, 1.0);
        assert!(!zero.is_valid());

        let negative = Tick::new(ts(0), "btcusdt", -10.0, 1.0);
        assert!(!negative.is_valid());

        let nan = Tick::new(ts(0), "btcusdt", f64::NAN, 1.0);
        assert!(!nan.is_valid());
    }

    #[test]
    fn test_invalid_quantity() {
        let tick = Tick::new(ts(0), "btcusdt", 100.0, -0.5);
        assert!(!tick.is_valid());
    }

    #[test]
    fn test_zero_quantity_allowed() {
        // Some venues report zero-quantity prints; they still carry a price
        let tick = Tick::new(ts(0), "ethusdt", 100.0, 0.0);
        assert!(tick.is_valid());
    }
}
