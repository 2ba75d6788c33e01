//! Analytics Parameters
//!
//! One explicit configuration structure passed into each computation cycle.
//! No implicit global defaults are consulted mid-computation.

use serde::{Deserialize, Serialize};

use crate::domain::Resolution;

/// Return calculation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnMethod {
    /// (close_t - close_{t-1}) / close_{t-1}
    Simple,
    /// ln(close_t / close_{t-1})
    Log,
}

/// Hedge-ratio regression mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegressionMode {
    /// Closed-form least squares
    Ols,
    /// Iteratively reweighted least squares with Huber loss
    Huber,
}

/// Trader-tunable analytics configuration, passed whole into each cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Rolling window size in bars
    pub window: usize,
    /// Hedge-ratio regression mode
    pub regression_mode: RegressionMode,
    /// Return calculation method
    pub return_method: ReturnMethod,
    /// Z-score band for entry signals
    pub z_threshold: f64,
    /// Correlation magnitude separating coupled from decoupled regimes
    pub correlation_threshold: f64,
    /// ADF significance level for the stationarity verdict
    pub adf_significance: f64,
    /// Fixed ADF lag order; auto-selected by AIC when None
    pub adf_lag: Option<usize>,
    /// Huber tuning constant (1.345 gives 95% efficiency under normality)
    pub huber_c: f64,
    /// Huber IRLS iteration cap
    pub huber_max_iter: usize,
    /// Huber IRLS convergence tolerance on the change in beta
    pub huber_tol: f64,
    /// Bar resolution the analytics cycle reads
    pub resolution: Resolution,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            window: 60,
            regression_mode: RegressionMode::Ols,
            return_method: ReturnMethod::Log,
            z_threshold: 2.0,
            correlation_threshold: 0.6,
            adf_significance: 0.05,
            adf_lag: None,
            huber_c: 1.345,
            huber_max_iter: 50,
            huber_tol: 1e-8,
            resolution: Resolution::Min1,
        }
    }
}

impl AnalyticsConfig {
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_regression_mode(mut self, mode: RegressionMode) -> Self {
        self.regression_mode = mode;
        self
    }

    pub fn with_z_threshold(mut self, threshold: f64) -> Self {
        self.z_threshold = threshold;
        self
    }

    /// Validate parameter ranges
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.window < 2 {
            return Err(ParamsError::InvalidWindow(self.window));
        }
        if self.z_threshold <= 0.0 {
            return Err(ParamsError::InvalidZThreshold(self.z_threshold));
        }
        if !(0.0..=1.0).contains(&self.correlation_threshold) {
            return Err(ParamsError::InvalidCorrelationThreshold(self.correlation_threshold));
        }
        if !(0.0..1.0).contains(&self.adf_significance) || self.adf_significance == 0.0 {
            return Err(ParamsError::InvalidSignificance(self.adf_significance));
        }
        if self.huber_c <= 0.0 {
            return Err(ParamsError::InvalidHuberConstant(self.huber_c));
        }
        if self.huber_max_iter == 0 {
            return Err(ParamsError::InvalidHuberIterations);
        }
        Ok(())
    }
}

/// Parameter validation errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParamsError {
    #[error("Invalid window size: {0} (minimum 2)")]
    InvalidWindow(usize),
    #[error("Invalid z-threshold: {0} (must be > 0)")]
    InvalidZThreshold(f64),
    #[error("Invalid correlation threshold: {0} (must be 0-1)")]
    InvalidCorrelationThreshold(f64),
    #[error("Invalid ADF significance: {0} (must be in (0, 1))")]
    InvalidSignificance(f64),
    #[error("Invalid Huber tuning constant: {0} (must be > 0)")]
    InvalidHuberConstant(f64),
    #[error("Huber iteration cap must be > 0")]
    InvalidHuberIterations,
}
