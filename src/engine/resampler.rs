//! Resampler - multi-resolution OHLCV bars from the tick stream
//!
//! Each configured resolution is derived independently from raw ticks; no
//! resolution is computed from another's bars, so bucketing error never
//! compounds. The in-progress bar per (symbol, resolution) lives in an
//! explicit keyed table, mutable until its interval ends. A late tick
//! accepted inside the skew window revises its already-closed bar in place;
//! one whose interval never materialized is dropped from resampling.
//! Intervals that receive no ticks are simply absent - gaps are never
//! zero-filled with synthetic bars.
//!
//! Bars bucket on tick timestamps, not wall clock, so replaying the same
//! tick sequence always yields identical bars.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::domain::{Bar, Resolution, RollingWindow, Tick};

/// Converts tick sequences into OHLCV bars at the configured resolutions
#[derive(Debug, Clone)]
pub struct Resampler {
    resolutions: Vec<Resolution>,
    /// In-progress bar per (symbol, resolution)
    current: HashMap<(String, Resolution), Bar>,
    /// Closed bars per (symbol, resolution), oldest first, bounded
    closed: HashMap<(String, Resolution), RollingWindow<Bar>>,
    /// Closed bars kept per key
    retention: usize,
}

impl Default for Resampler {
    fn default() -> Self {
        Self::new(Resolution::all().to_vec(), 10_000)
    }
}

impl Resampler {
    pub fn new(resolutions: Vec<Resolution>, retention: usize) -> Self {
        Self {
            resolutions,
            current: HashMap::new(),
            closed: HashMap::new(),
            retention,
        }
    }

    /// Update every configured resolution with a tick.
    ///
    /// Returns the bars that closed because this tick opened a new interval.
    pub fn on_tick(&mut self, tick: &Tick) -> Vec<Bar> {
        let mut emitted = Vec::new();
        let retention = self.retention;

        for &resolution in &self.resolutions {
            let key = (tick.symbol.clone(), resolution);
            let bucket = resolution.bucket(tick.timestamp);

            match self.current.get_mut(&key) {
                Some(bar) if bar.interval_start == bucket => {
                    bar.apply(tick.price, tick.quantity);
                }
                Some(bar) if bucket < bar.interval_start => {
                    // Late tick accepted inside the skew window: fold the
                    // revision into its already-closed bar instead of
                    // rotating the in-progress bar backwards. The revision
                    // stays in-memory; the bar was already emitted.
                    match self
                        .closed
                        .get_mut(&key)
                        .and_then(|series| {
                            series.iter_mut().rev().find(|b| b.interval_start == bucket)
                        }) {
                        Some(closed) => closed.apply(tick.price, tick.quantity),
                        None => warn!(
                            symbol = %tick.symbol,
                            resolution = %resolution,
                            "late tick has no bar to revise, dropped from resampling"
                        ),
                    }
                }
                Some(bar) => {
                    // Tick falls into a new interval: close the old bar
                    let completed = std::mem::replace(
                        bar,
                        Bar::open_at(&tick.symbol, resolution, bucket, tick.price, tick.quantity),
                    );
                    debug!(
                        symbol = %completed.symbol,
                        resolution = %resolution,
                        close = completed.close,
                        volume = completed.volume,
                        "bar closed"
                    );
                    self.closed
                        .entry(key)
                        .or_insert_with(|| RollingWindow::new(retention))
                        .push(completed.clone());
                    emitted.push(completed);
                }
                None => {
                    self.current.insert(
                        key,
                        Bar::open_at(&tick.symbol, resolution, bucket, tick.price, tick.quantity),
                    );
                }
            }
        }

        emitted
    }

    /// The last `limit` closed bars plus the in-progress bar, oldest first
    pub fn get_bars(&self, symbol: &str, resolution: Resolution, limit: usize) -> Vec<Bar> {
        let key = (symbol.to_string(), resolution);
        let mut bars = self.closed_tail(&key, limit);
        if let Some(current) = self.current.get(&key) {
            bars.push(current.clone());
        }
        bars
    }

    /// Only closed (immutable) bars, oldest first
    pub fn get_closed_bars(&self, symbol: &str, resolution: Resolution, limit: usize) -> Vec<Bar> {
        self.closed_tail(&(symbol.to_string(), resolution), limit)
    }

    /// Number of closed bars for a key
    pub fn closed_count(&self, symbol: &str, resolution: Resolution) -> usize {
        self.closed
            .get(&(symbol.to_string(), resolution))
            .map(RollingWindow::len)
            .unwrap_or(0)
    }

    fn closed_tail(&self, key: &(String, Resolution), limit: usize) -> Vec<Bar> {
        match self.closed.get(key) {
            Some(series) => {
                let skip = series.len().saturating_sub(limit);
                series.iter().skip(skip).cloned().collect()
            }
            None => Vec::new(),
        }
    }

    pub fn resolutions(&self) -> &[Resolution] {
        &self.resolutions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn tick(secs: i64, price: f64, qty: f64) -> Tick {
        Tick::new(ts(secs), "btcusdt", price, qty)
    }

    #[test]
    fn test_one_tick_per_second_bars() {
        let mut resampler = Resampler::new(vec![Resolution::Sec1], 100);
        let prices = [100.0, 101.0, 99.0, 105.0, 102.0];

        for (i, &price) in prices.iter().enumerate() {
            resampler.on_tick(&tick(i as i64, price, 1.0));
        }

        // 4 closed + 1 in progress, each with exactly one constituent tick
        assert_eq!(resampler.closed_count("btcusdt", Resolution::Sec1), 4);
        let bars = resampler.get_bars("btcusdt", Resolution::Sec1, 10);
        assert_eq!(bars.len(), 5);
        for (bar, &price) in bars.iter().zip(prices.iter()) {
            assert_eq!(bar.open, price);
            assert_eq!(bar.close, price);
            assert_eq!(bar.volume, 1.0);
        }
    }

    #[test]
    fn test_ohlc_within_interval() {
        let mut resampler = Resampler::new(vec![Resolution::Min1], 100);
        resampler.on_tick(&tick(0, 100.0, 1.0));
        resampler.on_tick(&tick(10, 110.0, 2.0));
        resampler.on_tick(&tick(20, 95.0, 0.5));
        resampler.on_tick(&tick(30, 105.0, 1.5));

        let bars = resampler.get_bars("btcusdt", Resolution::Min1, 10);
        assert_eq!(bars.len(), 1);
        let bar = &bars[0];
        assert_eq!(bar.open, 100.0);
        assert_eq!(bar.high, 110.0);
        assert_eq!(bar.low, 95.0);
        assert_eq!(bar.close, 105.0);
        assert_eq!(bar.volume, 5.0);
        assert!(bar.is_valid());
    }

    #[test]
    fn test_interval_rollover_emits_closed_bar() {
        let mut resampler = Resampler::new(vec![Resolution::Min1], 100);
        resampler.on_tick(&tick(59, 100.0, 1.0));
        let emitted = resampler.on_tick(&tick(60, 101.0, 1.0));

        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].interval_start, ts(0));
        assert_eq!(emitted[0].close, 100.0);

        let bars = resampler.get_bars("btcusdt", Resolution::Min1, 10);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].interval_start, ts(60));
        assert_eq!(bars[1].open, 101.0);
    }

    #[test]
    fn test_gaps_are_absent_not_zero_filled() {
        let mut resampler = Resampler::new(vec![Resolution::Sec1], 100);
        resampler.on_tick(&tick(0, 100.0, 1.0));
        // Nothing for t=1..=4
        resampler.on_tick(&tick(5, 105.0, 1.0));

        let bars = resampler.get_bars("btcusdt", Resolution::Sec1, 10);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].interval_start, ts(0));
        assert_eq!(bars[1].interval_start, ts(5));
    }

    #[test]
    fn test_resolutions_independent() {
        let mut resampler = Resampler::default();
        // 90 seconds of one tick per second
        for i in 0..90 {
            resampler.on_tick(&tick(i, 100.0 + (i % 7) as f64, 1.0));
        }

        // 1s: 89 closed; 1m: 1 closed; 5m: still in the first interval
        assert_eq!(resampler.closed_count("btcusdt", Resolution::Sec1), 89);
        assert_eq!(resampler.closed_count("btcusdt", Resolution::Min1), 1);
        assert_eq!(resampler.closed_count("btcusdt", Resolution::Min5), 0);

        // The 1m closed bar covers ticks 0..60: volume = 60
        let minute = resampler.get_closed_bars("btcusdt", Resolution::Min1, 10);
        assert_eq!(minute[0].volume, 60.0);
    }

    #[test]
    fn test_resampling_idempotent() {
        let ticks: Vec<Tick> = (0..120)
            .map(|i| tick(i, 100.0 + ((i * 13) % 11) as f64, 0.5))
            .collect();

        let mut first = Resampler::default();
        let mut second = Resampler::default();
        for t in &ticks {
            first.on_tick(t);
        }
        for t in &ticks {
            second.on_tick(t);
        }

        for resolution in Resolution::all() {
            assert_eq!(
                first.get_bars("btcusdt", resolution, 1000),
                second.get_bars("btcusdt", resolution, 1000)
            );
        }
    }

    #[test]
    fn test_volume_is_sum_of_quantities() {
        let mut resampler = Resampler::new(vec![Resolution::Min1], 100);
        let quantities = [0.3, 1.2, 0.5, 2.0];
        for (i, &qty) in quantities.iter().enumerate() {
            resampler.on_tick(&tick(i as i64, 100.0, qty));
        }
        let bars = resampler.get_bars("btcusdt", Resolution::Min1, 10);
        let total: f64 = quantities.iter().sum();
        assert!((bars[0].volume - total).abs() < 1e-12);
    }

    #[test]
    fn test_get_bars_limit() {
        let mut resampler = Resampler::new(vec![Resolution::Sec1], 100);
        for i in 0..10 {
            resampler.on_tick(&tick(i, 100.0, 1.0));
        }
        // 9 closed + 1 current; limit applies to closed bars
        let bars = resampler.get_bars("btcusdt", Resolution::Sec1, 3);
        assert_eq!(bars.len(), 4);
        assert_eq!(bars[0].interval_start, ts(6));
    }

    #[test]
    fn test_late_tick_folds_into_closed_bar() {
        let mut resampler = Resampler::new(vec![Resolution::Sec1], 100);
        resampler.on_tick(&tick(10, 100.0, 1.0));
        resampler.on_tick(&tick(11, 105.0, 1.0)); // closes the t=10 bar

        // Revision for the closed interval: folded in place, no rotation
        resampler.on_tick(&tick(10, 90.0, 1.0));

        let bars = resampler.get_bars("btcusdt", Resolution::Sec1, 10);
        let starts: Vec<_> = bars.iter().map(|b| b.interval_start).collect();
        assert_eq!(starts, vec![ts(10), ts(11)]);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].volume, 2.0);
        assert_eq!(resampler.closed_count("btcusdt", Resolution::Sec1), 1);
    }

    #[test]
    fn test_late_tick_for_missing_interval_skipped() {
        let mut resampler = Resampler::new(vec![Resolution::Sec1], 100);
        resampler.on_tick(&tick(5, 100.0, 1.0));
        resampler.on_tick(&tick(7, 101.0, 1.0)); // closes t=5, t=6 is a gap

        // No bar was ever materialized for t=6: nothing to revise
        let emitted = resampler.on_tick(&tick(6, 99.0, 1.0));
        assert!(emitted.is_empty());

        let bars = resampler.get_bars("btcusdt", Resolution::Sec1, 10);
        let starts: Vec<_> = bars.iter().map(|b| b.interval_start).collect();
        assert_eq!(starts, vec![ts(5), ts(7)]);
    }

    #[test]
    fn test_symbols_do_not_interfere() {
        let mut resampler = Resampler::new(vec![Resolution::Sec1], 100);
        resampler.on_tick(&Tick::new(ts(0), "btcusdt", 100.0, 1.0));
        resampler.on_tick(&Tick::new(ts(0), "ethusdt", 10.0, 1.0));
        resampler.on_tick(&Tick::new(ts(1), "btcusdt", 101.0, 1.0));

        assert_eq!(resampler.get_bars("btcusdt", Resolution::Sec1, 10).len(), 2);
        assert_eq!(resampler.get_bars("ethusdt", Resolution::Sec1, 10).len(), 1);
    }
}
