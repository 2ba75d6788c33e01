//! Signal Engine
//!
//! Combines the latest spread z-score, ADF verdict and rolling correlation
//! into a discrete trade signal and a market-regime label, and evaluates
//! alert thresholds. Recomputed every cycle; nothing here is persisted.
//!
//! If any upstream statistic reports insufficiency the cycle short-circuits
//! to a safe Neutral / insufficient-data outcome rather than propagating a
//! partial signal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::adf::AdfResult;
use super::params::AnalyticsConfig;
use super::StatError;

/// Discrete trade signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalAction {
    /// Spread underextended: expect reversion up
    Buy,
    /// Spread overextended: expect reversion down
    Sell,
    Neutral,
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalAction::Buy => write!(f, "BUY"),
            SignalAction::Sell => write!(f, "SELL"),
            SignalAction::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Coarse market-regime label for the pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Regime {
    /// Stationary spread, high correlation: pair trading conditions
    MeanReverting,
    /// Non-stationary spread, high correlation: the pair drifts together
    Trending,
    /// Low correlation: the legs no longer move together
    Decoupled,
    /// An upstream statistic is not ready yet
    InsufficientData,
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regime::MeanReverting => write!(f, "mean-reverting"),
            Regime::Trending => write!(f, "trending"),
            Regime::Decoupled => write!(f, "decoupled"),
            Regime::InsufficientData => write!(f, "insufficient-data"),
        }
    }
}

/// Per-cycle signal output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairSignal {
    pub timestamp: DateTime<Utc>,
    pub action: SignalAction,
    /// Spread z-score driving the action; None when upstream was not ready
    pub z_score: Option<f64>,
    pub regime: Regime,
}

/// Stateless signal derivation from upstream statistics
#[derive(Debug, Clone, Default)]
pub struct SignalEngine;

impl SignalEngine {
    /// Derive the cycle's signal from upstream results.
    ///
    /// Upstream errors are expected states: any insufficiency collapses the
    /// cycle to Neutral / insufficient-data.
    pub fn evaluate(
        &self,
        timestamp: DateTime<Utc>,
        z_score: &Result<f64, StatError>,
        adf: &Result<AdfResult, StatError>,
        correlation: &Result<f64, StatError>,
        config: &AnalyticsConfig,
    ) -> PairSignal {
        let (z, adf, corr) = match (z_score, adf, correlation) {
            (Ok(z), Ok(adf), Ok(corr)) => (*z, *adf, *corr),
            _ => {
                return PairSignal {
                    timestamp,
                    action: SignalAction::Neutral,
                    z_score: z_score.as_ref().ok().copied(),
                    regime: Regime::InsufficientData,
                }
            }
        };

        let action = if z > config.z_threshold {
            SignalAction::Sell
        } else if z < -config.z_threshold {
            SignalAction::Buy
        } else {
            SignalAction::Neutral
        };

        let regime = if corr.abs() < config.correlation_threshold {
            Regime::Decoupled
        } else if adf.is_stationary {
            Regime::MeanReverting
        } else {
            Regime::Trending
        };

        PairSignal {
            timestamp,
            action,
            z_score: Some(z),
            regime,
        }
    }
}

/// An alert emitted when the z-score crosses into or out of the alert band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertEvent {
    pub timestamp: DateTime<Utc>,
    pub z_score: f64,
    /// True on entry into the band, false on exit
    pub entered: bool,
}

/// Edge-debounced threshold watcher.
///
/// Emits one event per crossing, not one per cycle while the condition
/// holds. A cycle with no z-score (upstream not ready) keeps the previous
/// state, so a gap does not fabricate a fresh crossing.
#[derive(Debug, Clone)]
pub struct AlertMonitor {
    threshold: f64,
    in_band: bool,
}

impl AlertMonitor {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            in_band: false,
        }
    }

    /// Feed one cycle's z-score; Some(event) only on a band edge
    pub fn observe(&mut self, timestamp: DateTime<Utc>, z_score: Option<f64>) -> Option<AlertEvent> {
        let z = z_score?;
        let now_in_band = z.abs() > self.threshold;

        if now_in_band == self.in_band {
            return None;
        }
        self.in_band = now_in_band;

        Some(AlertEvent {
            timestamp,
            z_score: z,
            entered: now_in_band,
        })
    }

    pub fn in_band(&self) -> bool {
        self.in_band
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn adf_ok(stationary: bool) -> Result<AdfResult, StatError> {
        Ok(AdfResult {
            statistic: if stationary { -4.0 } else { -1.0 },
            p_value: if stationary { 0.001 } else { 0.6 },
            lag: 1,
            n_obs: 100,
            is_stationary: stationary,
        })
    }

    fn config() -> AnalyticsConfig {
        AnalyticsConfig::default() // z_threshold 2.0, correlation_threshold 0.6
    }

    #[test]
    fn test_sell_above_threshold() {
        let signal = SignalEngine.evaluate(ts(0), &Ok(2.5), &adf_ok(true), &Ok(0.9), &config());
        assert_eq!(signal.action, SignalAction::Sell);
        assert_eq!(signal.regime, Regime::MeanReverting);
        assert_eq!(signal.z_score, Some(2.5));
    }

    #[test]
    fn test_buy_below_threshold() {
        let signal = SignalEngine.evaluate(ts(0), &Ok(-3.1), &adf_ok(true), &Ok(0.8), &config());
        assert_eq!(signal.action, SignalAction::Buy);
    }

    #[test]
    fn test_neutral_inside_band() {
        let signal = SignalEngine.evaluate(ts(0), &Ok(0.4), &adf_ok(true), &Ok(0.9), &config());
        assert_eq!(signal.action, SignalAction::Neutral);
        assert_eq!(signal.regime, Regime::MeanReverting);
    }

    #[test]
    fn test_trending_regime() {
        let signal = SignalEngine.evaluate(ts(0), &Ok(0.0), &adf_ok(false), &Ok(0.9), &config());
        assert_eq!(signal.regime, Regime::Trending);
    }

    #[test]
    fn test_decoupled_beats_stationarity() {
        // Low correlation wins regardless of the ADF verdict
        let signal = SignalEngine.evaluate(ts(0), &Ok(0.0), &adf_ok(true), &Ok(0.2), &config());
        assert_eq!(signal.regime, Regime::Decoupled);
    }

    #[test]
    fn test_negative_correlation_magnitude_counts() {
        let signal = SignalEngine.evaluate(ts(0), &Ok(0.0), &adf_ok(true), &Ok(-0.85), &config());
        assert_eq!(signal.regime, Regime::MeanReverting);
    }

    #[test]
    fn test_upstream_insufficiency_short_circuits() {
        let not_ready: Result<f64, StatError> = Err(StatError::InsufficientData { needed: 60, have: 3 });
        let signal = SignalEngine.evaluate(ts(0), &Ok(5.0), &adf_ok(true), &not_ready, &config());

        // Even with an extreme z-score the cycle is Neutral
        assert_eq!(signal.action, SignalAction::Neutral);
        assert_eq!(signal.regime, Regime::InsufficientData);
    }

    #[test]
    fn test_degenerate_zscore_short_circuits() {
        let degenerate: Result<f64, StatError> = Err(StatError::DegenerateWindow { size: 60 });
        let signal = SignalEngine.evaluate(ts(0), &degenerate, &adf_ok(true), &Ok(0.9), &config());
        assert_eq!(signal.regime, Regime::InsufficientData);
        assert_eq!(signal.z_score, None);
    }

    #[test]
    fn test_alert_fires_once_per_crossing() {
        let mut monitor = AlertMonitor::new(2.0);

        // Crosses once, stays above for 5 cycles
        let zs = [1.0, 2.5, 2.7, 3.0, 2.9, 2.6];
        let mut events = Vec::new();
        for (i, &z) in zs.iter().enumerate() {
            if let Some(event) = monitor.observe(ts(i as i64), Some(z)) {
                events.push(event);
            }
        }

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].timestamp, ts(1));
        assert!(events[0].entered);
    }

    #[test]
    fn test_alert_exit_event() {
        let mut monitor = AlertMonitor::new(2.0);
        monitor.observe(ts(0), Some(2.5));
        let exit = monitor.observe(ts(1), Some(0.5)).unwrap();
        assert!(!exit.entered);
        assert!(!monitor.in_band());
    }

    #[test]
    fn test_alert_negative_band() {
        let mut monitor = AlertMonitor::new(2.0);
        let event = monitor.observe(ts(0), Some(-2.4)).unwrap();
        assert!(event.entered);
    }

    #[test]
    fn test_alert_gap_keeps_state() {
        let mut monitor = AlertMonitor::new(2.0);
        monitor.observe(ts(0), Some(2.5));

        // A not-ready cycle in between must not fabricate a fresh crossing
        assert!(monitor.observe(ts(1), None).is_none());
        assert!(monitor.observe(ts(2), Some(2.6)).is_none());
    }
}
