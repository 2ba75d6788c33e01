//! OHLCV Bar
//!
//! Bars are derived by the resampler, never created directly by a user.
//! One bar per (symbol, resolution, interval_start); a bar with zero
//! constituent ticks is never materialized.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported resampling resolutions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    /// 1 second
    Sec1,
    /// 1 minute
    Min1,
    /// 5 minutes
    Min5,
}

impl Resolution {
    /// Interval length in seconds
    pub fn seconds(&self) -> i64 {
        match self {
            Resolution::Sec1 => 1,
            Resolution::Min1 => 60,
            Resolution::Min5 => 300,
        }
    }

    /// Start of the interval containing `ts`: floor(ts / res) * res
    pub fn bucket(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let secs = self.seconds();
        let bucket = ts.timestamp().div_euclid(secs) * secs;
        Utc.timestamp_opt(bucket, 0).unwrap()
    }

    /// All resolutions the engine derives in parallel
    pub fn all() -> [Resolution; 3] {
        [Resolution::Sec1, Resolution::Min1, Resolution::Min5]
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Sec1 => write!(f, "1s"),
            Resolution::Min1 => write!(f, "1m"),
            Resolution::Min5 => write!(f, "5m"),
        }
    }
}

impl std::str::FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1s" => Ok(Resolution::Sec1),
            "1m" => Ok(Resolution::Min1),
            "5m" => Ok(Resolution::Min5),
            other => Err(format!("unknown resolution '{}' (expected 1s, 1m or 5m)", other)),
        }
    }
}

/// An OHLCV bar for one (symbol, resolution, interval_start)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub resolution: Resolution,
    pub interval_start: DateTime<Utc>,
    pub interval_end: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Sum of constituent tick quantities
    pub volume: f64,
}

impl Bar {
    /// Open a new bar from the first tick of an interval
    pub fn open_at(
        symbol: impl Into<String>,
        resolution: Resolution,
        interval_start: DateTime<Utc>,
        price: f64,
        quantity: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            resolution,
            interval_start,
            interval_end: interval_start + Duration::seconds(resolution.seconds()),
            open: price,
            high: price,
            low: price,
            close: price,
            volume: quantity,
        }
    }

    /// Fold another tick into the bar
    pub fn apply(&mut self, price: f64, quantity: f64) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
        self.volume += quantity;
    }

    /// OHLC integrity: low <= open,close <= high, all finite
    pub fn is_valid(&self) -> bool {
        self.high >= self.low
            && self.open >= self.low
            && self.open <= self.high
            && self.close >= self.low
            && self.close <= self.high
            && self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume >= 0.0
    }
}
