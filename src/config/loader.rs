//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config.toml structure.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::domain::Resolution;
use crate::engine::params::{AnalyticsConfig, RegressionMode, ReturnMethod};

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub engine: EngineSection,
    pub analytics: AnalyticsSection,
    pub signal: SignalSection,
    pub logging: LoggingSection,
}

/// Ingestion and resampling section
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// Symbols to track, e.g. ["btcusdt", "ethusdt"]; the first two form the pair
    pub symbols: Vec<String>,
    /// Maximum backwards timestamp skew accepted at ingestion (seconds, 0 = strict)
    #[serde(default)]
    pub max_skew_seconds: i64,
    /// Ticks retained per symbol
    #[serde(default = "default_tick_retention")]
    pub tick_retention: usize,
    /// Seconds between computation cycles
    #[serde(default = "default_poll_seconds")]
    pub poll_seconds: u64,
}

fn default_tick_retention() -> usize {
    10_000
}

fn default_poll_seconds() -> u64 {
    5
}

/// Rolling analytics section
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsSection {
    /// Rolling window size in bars
    pub window: usize,
    /// "ols" or "huber"
    pub regression_mode: RegressionMode,
    /// "simple" or "log"
    pub return_method: ReturnMethod,
    /// Bar resolution feeding the analytics: "1s", "1m" or "5m"
    pub resolution: String,
    /// ADF significance level for the stationarity verdict
    pub adf_significance: f64,
    /// Fixed ADF lag order; omit for AIC auto-selection
    #[serde(default)]
    pub adf_lag: Option<usize>,
    /// Huber tuning constant
    #[serde(default = "default_huber_c")]
    pub huber_c: f64,
}

fn default_huber_c() -> f64 {
    1.345
}

/// Signal thresholds section
#[derive(Debug, Clone, Deserialize)]
pub struct SignalSection {
    /// Z-score band for entry signals (symmetric)
    pub z_threshold: f64,
    /// Correlation magnitude separating coupled from decoupled regimes
    pub correlation_threshold: f64,
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.symbols.len() < 2 {
            return Err(ConfigError::ValidationError(format!(
                "need at least 2 symbols for a pair, got {}",
                self.engine.symbols.len()
            )));
        }

        if self.engine.max_skew_seconds < 0 {
            return Err(ConfigError::ValidationError(format!(
                "max_skew_seconds must be >= 0, got {}",
                self.engine.max_skew_seconds
            )));
        }

        if self.engine.tick_retention == 0 {
            return Err(ConfigError::ValidationError(
                "tick_retention must be > 0".to_string(),
            ));
        }

        if self.engine.poll_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "poll_seconds must be > 0".to_string(),
            ));
        }

        if self.analytics.window < 2 {
            return Err(ConfigError::ValidationError(format!(
                "window must be >= 2, got {}",
                self.analytics.window
            )));
        }

        self.analytics
            .resolution
            .parse::<Resolution>()
            .map_err(ConfigError::ValidationError)?;

        if self.analytics.adf_significance <= 0.0 || self.analytics.adf_significance >= 1.0 {
            return Err(ConfigError::ValidationError(format!(
                "adf_significance must be in (0, 1), got {}",
                self.analytics.adf_significance
            )));
        }

        if self.signal.z_threshold <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "z_threshold must be > 0, got {}",
                self.signal.z_threshold
            )));
        }

        if !(0.0..=1.0).contains(&self.signal.correlation_threshold) {
            return Err(ConfigError::ValidationError(format!(
                "correlation_threshold must be 0-1, got {}",
                self.signal.correlation_threshold
            )));
        }

        const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unknown logging level '{}' (expected trace, debug, info, warn or error)",
                self.logging.level
            )));
        }

        Ok(())
    }
}

// Conversion from Config to the per-cycle analytics parameters
impl From<&Config> for AnalyticsConfig {
    fn from(config: &Config) -> Self {
        AnalyticsConfig {
            window: config.analytics.window,
            regression_mode: config.analytics.regression_mode,
            return_method: config.analytics.return_method,
            z_threshold: config.signal.z_threshold,
            correlation_threshold: config.signal.correlation_threshold,
            adf_significance: config.analytics.adf_significance,
            adf_lag: config.analytics.adf_lag,
            huber_c: config.analytics.huber_c,
            resolution: config
                .analytics
                .resolution
                .parse()
                .unwrap_or(Resolution::Min1),
            ..AnalyticsConfig::default()
        }
    }
}
