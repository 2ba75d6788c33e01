//! Quantdash - Streaming Pair-Trading Analytics Engine
//!
//! Resamples tick streams into OHLC bars and derives mean-reversion
//! signals for a symbol pair.

mod adapters;
mod application;
mod config;
mod domain;
mod engine;
mod ports;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use crate::adapters::cli::{AnalyzeCmd, CliApp, Command, RunCmd};
use crate::adapters::{load_bars, SyntheticFeed};
use crate::application::{AnalyticsEngine, AnalyticsOrchestrator, PairAnalytics};
use crate::config::load_config;
use crate::domain::Resolution;
use crate::engine::params::{AnalyticsConfig, RegressionMode};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let app = CliApp::parse();

    match app.command {
        Command::Run(cmd) => run_command(cmd, app.verbose, app.debug).await,
        Command::Analyze(cmd) => analyze_command(cmd, app.verbose, app.debug).await,
    }
}

/// The configured level is the default; `-v`/`--debug` override it
fn init_logging(verbose: bool, debug: bool, default_level: &str) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_new(default_level).context("Invalid logging level in configuration")?
    };

    fmt().with_env_filter(filter).init();
    Ok(())
}

async fn run_command(cmd: RunCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    init_logging(verbose, debug, &config.logging.level)?;

    tracing::info!("Starting quantdash analytics engine...");
    let analytics_config = AnalyticsConfig::from(&config);

    let symbol_a = config.engine.symbols[0].clone();
    let symbol_b = config.engine.symbols[1].clone();

    let engine = Arc::new(AnalyticsEngine::new(
        analytics_config,
        symbol_a,
        symbol_b,
        chrono::Duration::seconds(config.engine.max_skew_seconds),
        config.engine.tick_retention,
    ));

    let feed = Arc::new(SyntheticFeed::new(
        cmd.seed,
        std::time::Duration::from_millis(cmd.tick_interval_ms),
    ));

    let orchestrator = AnalyticsOrchestrator::new(engine, feed)
        .with_poll_interval(std::time::Duration::from_secs(config.engine.poll_seconds));

    // Setup Ctrl+C handler
    let orch = orchestrator.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        orch.stop().await;
    });

    orchestrator.run().await?;
    tracing::info!("Quantdash stopped");
    Ok(())
}

async fn analyze_command(cmd: AnalyzeCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    init_logging(verbose, debug, &config.logging.level)?;

    let mut analytics_config = AnalyticsConfig::from(&config);

    if let Some(window) = cmd.window {
        analytics_config.window = window;
    }
    if let Some(mode) = &cmd.mode {
        analytics_config.regression_mode = match mode.as_str() {
            "ols" => RegressionMode::Ols,
            "huber" => RegressionMode::Huber,
            other => bail!("Unknown regression mode '{}', expected ols or huber", other),
        };
    }
    analytics_config.validate().context("Invalid analytics parameters")?;

    let resolution = analytics_config.resolution;
    let closes_a = load_closes(&cmd.file_a, resolution)?;
    let closes_b = load_closes(&cmd.file_b, resolution)?;

    let analytics = AnalyticsEngine::analyze_pair(&closes_a, &closes_b, &analytics_config);
    print_analytics(&analytics, closes_a.len(), closes_b.len());
    Ok(())
}

fn load_closes(path: &Path, resolution: Resolution) -> Result<Vec<(DateTime<Utc>, f64)>> {
    let symbol = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string();

    let bars = load_bars(path, &symbol, resolution)
        .with_context(|| format!("Failed to import {}", path.display()))?;

    Ok(bars.iter().map(|b| (b.interval_start, b.close)).collect())
}

fn print_analytics(analytics: &PairAnalytics, n_a: usize, n_b: usize) {
    println!("Observations: {} / {}", n_a, n_b);

    match &analytics.stats.hedge {
        Ok(fit) => println!(
            "Hedge ratio: beta={:.6} alpha={:.6} r2={:.4} converged={}",
            fit.beta, fit.alpha, fit.r_squared, fit.converged
        ),
        Err(e) => println!("Hedge ratio: {}", e),
    }

    match &analytics.stats.correlation {
        Ok(corr) => println!("Correlation: {:.4}", corr),
        Err(e) => println!("Correlation: {}", e),
    }

    match &analytics.stats.spread_zscore {
        Ok(z) => println!("Spread z-score: {:.4}", z),
        Err(e) => println!("Spread z-score: {}", e),
    }

    match &analytics.adf {
        Ok(adf) => println!(
            "ADF: stat={:.4} p={:.4} lag={} n={} stationary={}",
            adf.statistic, adf.p_value, adf.lag, adf.n_obs, adf.is_stationary
        ),
        Err(e) => println!("ADF: {}", e),
    }

    println!(
        "Signal: {:?} ({})",
        analytics.signal.action, analytics.signal.regime
    );
}
