//! Analytics Engine
//!
//! Owns the shared mutable state (tick buffer and in-progress bars) behind
//! a single RwLock and derives every statistic from an immutable snapshot
//! taken at the start of a computation cycle. Ingestion and computation
//! therefore never block each other beyond the buffer's own append/read
//! discipline, and a cycle in flight always completes on its snapshot.
//!
//! All pull accessors return `Result<_, StatError>` so the dashboard can
//! tell "not computed yet" apart from "computed and neutral".

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{Bar, Resolution, Tick};
use crate::engine::adf::{adf_test, AdfResult};
use crate::engine::params::{AnalyticsConfig, RegressionMode};
use crate::engine::regression::{fit_hedge_ratio, HedgeRatioFit};
use crate::engine::resampler::Resampler;
use crate::engine::returns::returns;
use crate::engine::rolling::{self, zscore};
use crate::engine::signal::{PairSignal, SignalEngine};
use crate::engine::spread::SpreadSeries;
use crate::engine::tick_buffer::{IngestError, TickBuffer, TrimPolicy};
use crate::engine::StatError;

/// Minimum aligned observations before a hedge ratio is attempted
pub const HEDGE_MIN_POINTS: usize = 20;

/// Rolling statistics bundle for one pair and one cycle
#[derive(Debug, Clone)]
pub struct RollingStats {
    pub z_score_a: Result<f64, StatError>,
    pub z_score_b: Result<f64, StatError>,
    pub correlation: Result<f64, StatError>,
    pub hedge: Result<HedgeRatioFit, StatError>,
    pub spread_zscore: Result<f64, StatError>,
}

/// Everything one computation cycle produces for the dashboard
#[derive(Debug, Clone)]
pub struct PairAnalytics {
    pub timestamp: DateTime<Utc>,
    pub stats: RollingStats,
    pub adf: Result<AdfResult, StatError>,
    pub signal: PairSignal,
}

/// Shared mutable state: the only thing ingestion writes
#[derive(Debug)]
struct SharedState {
    buffer: TickBuffer,
    resampler: Resampler,
}

/// The streaming analytics engine for one symbol pair
pub struct AnalyticsEngine {
    state: Arc<RwLock<SharedState>>,
    config: AnalyticsConfig,
    symbol_a: String,
    symbol_b: String,
}

impl AnalyticsEngine {
    pub fn new(
        config: AnalyticsConfig,
        symbol_a: impl Into<String>,
        symbol_b: impl Into<String>,
        max_skew: Duration,
        tick_retention: usize,
    ) -> Self {
        let buffer = TickBuffer::new(max_skew, TrimPolicy::max_count(tick_retention));
        let resampler = Resampler::new(Resolution::all().to_vec(), tick_retention);

        Self {
            state: Arc::new(RwLock::new(SharedState { buffer, resampler })),
            config,
            symbol_a: symbol_a.into(),
            symbol_b: symbol_b.into(),
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn pair(&self) -> (&str, &str) {
        (&self.symbol_a, &self.symbol_b)
    }

    /// Ingest one tick: append to the buffer and update every resolution's
    /// in-progress bar. Returns the bars this tick closed, for outward
    /// storage. An out-of-order tick is rejected; ingestion continues.
    pub async fn ingest(&self, tick: Tick) -> Result<Vec<Bar>, IngestError> {
        let mut state = self.state.write().await;
        state.buffer.append(tick.clone())?;
        Ok(state.resampler.on_tick(&tick))
    }

    /// Buffered tick count for a symbol
    pub async fn tick_count(&self, symbol: &str) -> usize {
        self.state.read().await.buffer.len(symbol)
    }

    /// The last `limit` closed bars plus the in-progress bar, oldest first
    pub async fn get_bars(&self, symbol: &str, resolution: Resolution, limit: usize) -> Vec<Bar> {
        self.state.read().await.resampler.get_bars(symbol, resolution, limit)
    }

    /// Returns over the closed bars of one symbol at the configured resolution
    pub async fn get_returns(&self, symbol: &str) -> Result<Vec<(DateTime<Utc>, f64)>, StatError> {
        let bars = self.closed_bars(symbol).await;
        returns(&bars, self.config.return_method)
    }

    /// Rolling z-score history over one symbol's closes, oldest first.
    ///
    /// One entry per full window; individual windows may still be
    /// degenerate, so each entry carries its own result.
    pub async fn get_zscore_history(
        &self,
        symbol: &str,
    ) -> Result<Vec<Result<f64, StatError>>, StatError> {
        let bars = self.closed_bars(symbol).await;
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        rolling::zscore_series(&closes, self.config.window)
    }

    /// Rolling statistics with trader-supplied overrides for window and mode
    pub async fn get_rolling_stats(&self, window: usize, mode: RegressionMode) -> RollingStats {
        let mut config = self.config.clone();
        config.window = window;
        config.regression_mode = mode;

        let (closes_a, closes_b) = self.pair_closes(&config).await;
        Self::compute_stats(&closes_a, &closes_b, &config)
    }

    /// ADF verdict over the current spread window
    pub async fn get_adf_result(&self) -> Result<AdfResult, StatError> {
        self.compute_cycle().await.adf
    }

    /// The current cycle's trade signal
    pub async fn get_signal(&self) -> PairSignal {
        self.compute_cycle().await.signal
    }

    /// Run one full computation cycle on a fresh snapshot.
    ///
    /// The hedge ratio (and with it the spread) is recomputed here and only
    /// here: once per cycle, from closed bars, never per tick.
    pub async fn compute_cycle(&self) -> PairAnalytics {
        let (closes_a, closes_b) = self.pair_closes(&self.config).await;
        Self::analyze_pair(&closes_a, &closes_b, &self.config)
    }

    /// Full analytics over two close series, no engine state involved.
    ///
    /// This is the whole cycle as a pure function: the live path feeds it
    /// snapshots, the offline path feeds it imported bars.
    pub fn analyze_pair(
        closes_a: &[(DateTime<Utc>, f64)],
        closes_b: &[(DateTime<Utc>, f64)],
        config: &AnalyticsConfig,
    ) -> PairAnalytics {
        let stats = Self::compute_stats(closes_a, closes_b, config);

        let adf = match &stats.hedge {
            Ok(fit) => {
                let spread = SpreadSeries::build(closes_a, closes_b, fit.beta);
                adf_test(&spread.values(), config.adf_lag, config.adf_significance)
            }
            Err(e) => Err(e.clone()),
        };

        let timestamp = closes_a
            .last()
            .map(|(ts, _)| *ts)
            .unwrap_or_else(Utc::now);

        let signal = SignalEngine.evaluate(
            timestamp,
            &stats.spread_zscore,
            &adf,
            &stats.correlation,
            config,
        );

        PairAnalytics {
            timestamp,
            stats,
            adf,
            signal,
        }
    }

    /// Pure statistics derivation from two close series.
    ///
    /// Each statistic fails independently; one leg being degenerate never
    /// hides the others' results.
    fn compute_stats(
        closes_a: &[(DateTime<Utc>, f64)],
        closes_b: &[(DateTime<Utc>, f64)],
        config: &AnalyticsConfig,
    ) -> RollingStats {
        let z_score_a = Self::close_zscore(closes_a, config.window);
        let z_score_b = Self::close_zscore(closes_b, config.window);

        let correlation = Self::return_correlation(closes_a, closes_b, config);

        let hedge = Self::hedge_ratio(closes_a, closes_b, config);

        let spread_zscore = match &hedge {
            Ok(fit) => SpreadSeries::build(closes_a, closes_b, fit.beta).zscore(config.window),
            Err(e) => Err(e.clone()),
        };

        RollingStats {
            z_score_a,
            z_score_b,
            correlation,
            hedge,
            spread_zscore,
        }
    }

    fn close_zscore(closes: &[(DateTime<Utc>, f64)], window: usize) -> Result<f64, StatError> {
        let values: Vec<f64> = closes.iter().map(|(_, c)| *c).collect();
        StatError::check_len(values.len(), window.max(2))?;
        zscore(&values[values.len() - window.max(2)..])
    }

    fn return_correlation(
        closes_a: &[(DateTime<Utc>, f64)],
        closes_b: &[(DateTime<Utc>, f64)],
        config: &AnalyticsConfig,
    ) -> Result<f64, StatError> {
        let rets_a = crate::engine::returns::price_returns(closes_a, config.return_method)?;
        let rets_b = crate::engine::returns::price_returns(closes_b, config.return_method)?;
        rolling::rolling_correlation(&rets_a, &rets_b, config.window)
    }

    fn hedge_ratio(
        closes_a: &[(DateTime<Utc>, f64)],
        closes_b: &[(DateTime<Utc>, f64)],
        config: &AnalyticsConfig,
    ) -> Result<HedgeRatioFit, StatError> {
        let aligned = rolling::align(closes_a, closes_b);
        StatError::check_len(aligned.len(), HEDGE_MIN_POINTS)?;

        let tail = &aligned[aligned.len().saturating_sub(config.window.max(HEDGE_MIN_POINTS))..];
        let x: Vec<f64> = tail.iter().map(|p| p.2).collect();
        let y: Vec<f64> = tail.iter().map(|p| p.1).collect();

        fit_hedge_ratio(
            &x,
            &y,
            config.regression_mode,
            config.huber_c,
            config.huber_max_iter,
            config.huber_tol,
        )
    }

    /// Snapshot of both legs' closed-bar closes at the configured resolution
    async fn pair_closes(
        &self,
        config: &AnalyticsConfig,
    ) -> (Vec<(DateTime<Utc>, f64)>, Vec<(DateTime<Utc>, f64)>) {
        // Four windows of history bounds the snapshot while leaving the ADF
        // and hedge regressions enough sample
        let limit = (config.window * 4).max(256);
        let state = self.state.read().await;
        let a = state
            .resampler
            .get_closed_bars(&self.symbol_a, config.resolution, limit);
        let b = state
            .resampler
            .get_closed_bars(&self.symbol_b, config.resolution, limit);
        drop(state);

        (Self::closes(&a), Self::closes(&b))
    }

    async fn closed_bars(&self, symbol: &str) -> Vec<Bar> {
        let limit = (self.config.window * 4).max(256);
        self.state
            .read()
            .await
            .resampler
            .get_closed_bars(symbol, self.config.resolution, limit)
    }

    fn closes(bars: &[Bar]) -> Vec<(DateTime<Utc>, f64)> {
        bars.iter().map(|b| (b.interval_start, b.close)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::params::ReturnMethod;
    use crate::engine::signal::{Regime, SignalAction};
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn engine(window: usize) -> AnalyticsEngine {
        let config = AnalyticsConfig {
            window,
            resolution: Resolution::Sec1,
            return_method: ReturnMethod::Simple,
            ..AnalyticsConfig::default()
        };
        AnalyticsEngine::new(config, "btcusdt", "ethusdt", Duration::zero(), 10_000)
    }

    /// Drive a correlated pair through the engine: B = A / 2 exactly,
    /// one tick per symbol per second, with a small deterministic wobble
    async fn feed_pair(engine: &AnalyticsEngine, n: usize) {
        for i in 0..n {
            let wobble = ((i * 31 % 17) as f64 - 8.0) * 0.3;
            let price_a = 100.0 + wobble + (i as f64) * 0.01;
            let price_b = price_a / 2.0;
            engine
                .ingest(Tick::new(ts(i as i64), "btcusdt", price_a, 1.0))
                .await
                .unwrap();
            engine
                .ingest(Tick::new(ts(i as i64), "ethusdt", price_b, 1.0))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_ingest_and_bars() {
        let engine = engine(3);
        for (i, price) in [100.0, 101.0, 99.0, 105.0, 102.0].into_iter().enumerate() {
            engine
                .ingest(Tick::new(ts(i as i64), "btcusdt", price, 1.0))
                .await
                .unwrap();
        }

        // One tick per second: each 1s bar holds exactly one tick
        let bars = engine.get_bars("btcusdt", Resolution::Sec1, 10).await;
        assert_eq!(bars.len(), 5);
        assert!(bars.iter().all(|b| b.volume == 1.0));
        assert_eq!(engine.tick_count("btcusdt").await, 5);
    }

    #[tokio::test]
    async fn test_late_tick_within_skew_keeps_bars_ordered() {
        let config = AnalyticsConfig {
            window: 3,
            resolution: Resolution::Sec1,
            ..AnalyticsConfig::default()
        };
        let engine =
            AnalyticsEngine::new(config, "btcusdt", "ethusdt", Duration::seconds(2), 10_000);

        engine.ingest(Tick::new(ts(10), "btcusdt", 100.0, 1.0)).await.unwrap();
        // Late but inside the skew window: buffered, and since its interval
        // never produced a bar it must not disturb the bar sequence
        engine.ingest(Tick::new(ts(9), "btcusdt", 99.0, 1.0)).await.unwrap();
        engine.ingest(Tick::new(ts(10), "btcusdt", 101.0, 1.0)).await.unwrap();
        engine.ingest(Tick::new(ts(11), "btcusdt", 102.0, 1.0)).await.unwrap();

        assert_eq!(engine.tick_count("btcusdt").await, 4);

        let bars = engine.get_bars("btcusdt", Resolution::Sec1, 10).await;
        let starts: Vec<_> = bars.iter().map(|b| b.interval_start).collect();
        assert_eq!(starts, vec![ts(10), ts(11)]);
        // Both in-order t=10 ticks made it into the t=10 bar
        assert_eq!(bars[0].volume, 2.0);
        assert_eq!(bars[0].close, 101.0);
    }

    #[tokio::test]
    async fn test_late_tick_revision_updates_closed_bar() {
        let engine = AnalyticsEngine::new(
            AnalyticsConfig {
                window: 3,
                resolution: Resolution::Sec1,
                ..AnalyticsConfig::default()
            },
            "btcusdt",
            "ethusdt",
            Duration::seconds(2),
            10_000,
        );

        engine.ingest(Tick::new(ts(10), "btcusdt", 100.0, 1.0)).await.unwrap();
        engine.ingest(Tick::new(ts(11), "btcusdt", 105.0, 1.0)).await.unwrap();
        // Revision for the closed t=10 interval folds into that bar
        engine.ingest(Tick::new(ts(10), "btcusdt", 90.0, 1.0)).await.unwrap();

        let bars = engine.get_bars("btcusdt", Resolution::Sec1, 10).await;
        let starts: Vec<_> = bars.iter().map(|b| b.interval_start).collect();
        assert_eq!(starts, vec![ts(10), ts(11)]);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].volume, 2.0);
    }

    #[tokio::test]
    async fn test_out_of_order_rejected_then_continues() {
        let engine = engine(3);
        engine.ingest(Tick::new(ts(10), "btcusdt", 100.0, 1.0)).await.unwrap();

        let stale = engine.ingest(Tick::new(ts(5), "btcusdt", 99.0, 1.0)).await;
        assert!(matches!(stale, Err(IngestError::OutOfOrder { .. })));

        engine.ingest(Tick::new(ts(11), "btcusdt", 101.0, 1.0)).await.unwrap();
        assert_eq!(engine.tick_count("btcusdt").await, 2);
    }

    #[tokio::test]
    async fn test_returns_progressive_enablement() {
        let engine = engine(3);

        // 5 ticks -> 4 closed 1s bars + 1 in progress -> 3 returns over closed bars
        for (i, price) in [100.0, 101.0, 99.0, 105.0, 102.0].into_iter().enumerate() {
            engine
                .ingest(Tick::new(ts(i as i64), "btcusdt", price, 1.0))
                .await
                .unwrap();
        }

        let rets = engine.get_returns("btcusdt").await.unwrap();
        assert_eq!(rets.len(), 3);
        assert_relative_eq!(rets[0].1, 0.01, epsilon = 1e-12);

        // A single bar is not enough
        let fresh = self::engine(3);
        fresh.ingest(Tick::new(ts(0), "btcusdt", 100.0, 1.0)).await.unwrap();
        fresh.ingest(Tick::new(ts(1), "btcusdt", 100.0, 1.0)).await.unwrap();
        assert!(matches!(
            fresh.get_returns("btcusdt").await,
            Err(StatError::InsufficientData { .. })
        ));
    }

    #[tokio::test]
    async fn test_insufficient_data_cycle_is_safe() {
        let engine = engine(60);
        engine.ingest(Tick::new(ts(0), "btcusdt", 100.0, 1.0)).await.unwrap();
        engine.ingest(Tick::new(ts(0), "ethusdt", 50.0, 1.0)).await.unwrap();

        let analytics = engine.compute_cycle().await;
        assert_eq!(analytics.signal.action, SignalAction::Neutral);
        assert_eq!(analytics.signal.regime, Regime::InsufficientData);
        assert!(analytics.stats.z_score_a.is_err());
        assert!(analytics.adf.is_err());
    }

    #[tokio::test]
    async fn test_full_cycle_on_correlated_pair() {
        let engine = engine(30);
        feed_pair(&engine, 120).await;

        let analytics = engine.compute_cycle().await;

        // B = A/2: hedge ratio ~2, correlation ~1
        let hedge = analytics.stats.hedge.as_ref().unwrap();
        assert_relative_eq!(hedge.beta, 2.0, epsilon = 1e-6);
        assert!(hedge.converged);

        let corr = analytics.stats.correlation.as_ref().unwrap();
        assert_relative_eq!(*corr, 1.0, epsilon = 1e-9);

        // Spread is flat up to numeric noise: degenerate, and the signal
        // short-circuits instead of inventing a number
        assert!(
            analytics.stats.spread_zscore.is_err() || analytics.signal.z_score.is_some()
        );
    }

    #[tokio::test]
    async fn test_statistics_fail_independently() {
        let engine = engine(10);
        // Only leg A gets data: pair stats fail, leg A z-score works
        for i in 0..40 {
            let price = 100.0 + ((i * 7 % 13) as f64);
            engine
                .ingest(Tick::new(ts(i), "btcusdt", price, 1.0))
                .await
                .unwrap();
        }

        let stats = engine.get_rolling_stats(10, RegressionMode::Ols).await;
        assert!(stats.z_score_a.is_ok());
        assert!(stats.z_score_b.is_err());
        assert!(stats.correlation.is_err());
        assert!(stats.hedge.is_err());
    }

    #[tokio::test]
    async fn test_flat_series_degenerate_not_zero() {
        let engine = engine(5);
        for i in 0..20 {
            engine
                .ingest(Tick::new(ts(i), "btcusdt", 100.0, 1.0))
                .await
                .unwrap();
        }

        let stats = engine.get_rolling_stats(5, RegressionMode::Ols).await;
        assert!(matches!(
            stats.z_score_a,
            Err(StatError::DegenerateWindow { .. })
        ));
    }

    #[tokio::test]
    async fn test_zscore_history_matches_latest_stat() {
        let engine = engine(5);
        for i in 0..30 {
            let price = 100.0 + ((i * 11 % 7) as f64);
            engine
                .ingest(Tick::new(ts(i), "btcusdt", price, 1.0))
                .await
                .unwrap();
        }

        // 29 closed bars, window 5: one z-score per full window
        let history = engine.get_zscore_history("btcusdt").await.unwrap();
        assert_eq!(history.len(), 25);

        // The newest history entry is the same statistic the cycle reports
        let latest = engine
            .get_rolling_stats(5, RegressionMode::Ols)
            .await
            .z_score_a
            .unwrap();
        let last = history.last().unwrap().as_ref().unwrap();
        assert_relative_eq!(*last, latest, epsilon = 1e-12);
    }

    #[tokio::test]
    async fn test_rolling_stats_window_override() {
        let engine = engine(30);
        feed_pair(&engine, 120).await;

        let narrow = engine.get_rolling_stats(5, RegressionMode::Ols).await;
        let wide = engine.get_rolling_stats(60, RegressionMode::Huber).await;
        assert!(narrow.z_score_a.is_ok());
        assert!(wide.z_score_a.is_ok());
    }
}
