//! Analytics Engine - the streaming statistics pipeline
//!
//! Data flows strictly upward, each stage pure given its input window:
//!
//! TickBuffer -> Resampler -> ReturnSeries -> rolling stats / regression
//! -> spread -> ADF -> signal
//!
//! Every statistic reports a typed "not ready" result below its minimum
//! sample size instead of a degenerate numeric value.

pub mod adf;
pub mod params;
pub mod regression;
pub mod resampler;
pub mod returns;
pub mod rolling;
pub mod signal;
pub mod spread;
pub mod tick_buffer;

pub use adf::{adf_test, AdfResult};
pub use params::{AnalyticsConfig, RegressionMode, ReturnMethod};
pub use regression::{fit_hedge_ratio, HedgeRatioFit};
pub use resampler::Resampler;
pub use returns::returns;
pub use rolling::{rolling_correlation, zscore, zscore_series};
pub use signal::{AlertEvent, AlertMonitor, PairSignal, Regime, SignalAction, SignalEngine};
pub use spread::SpreadSeries;
pub use tick_buffer::{IngestError, TickBuffer, TrimPolicy};

use thiserror::Error;

/// A statistic that could not be computed from the current window.
///
/// These are expected states, not failures: the caller distinguishes
/// "not computed yet" from "computed and neutral". One statistic failing
/// never blocks an independent statistic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatError {
    /// The minimum sample size for this statistic is not yet met
    #[error("insufficient data: need {needed} observations, have {have}")]
    InsufficientData { needed: usize, have: usize },

    /// The window has zero variance (flat series), the statistic is undefined
    #[error("degenerate window: zero variance over {size} observations")]
    DegenerateWindow { size: usize },

    /// The regressor carries no information (fewer than 2 distinct values)
    #[error("singular regression: regressor has no variation")]
    SingularRegression,
}

impl StatError {
    /// Helper for the common length check
    pub fn check_len(have: usize, needed: usize) -> Result<(), StatError> {
        if have < needed {
            Err(StatError::InsufficientData { needed, have })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_len() {
        assert!(StatError::check_len(5, 5).is_ok());
        assert_eq!(
            StatError::check_len(3, 5),
            Err(StatError::InsufficientData { needed: 5, have: 3 })
        );
    }

    #[test]
    fn test_error_display() {
        let err = StatError::InsufficientData { needed: 20, have: 7 };
        assert_eq!(err.to_string(), "insufficient data: need 20 observations, have 7");
    }
}
