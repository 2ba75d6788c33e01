//! Quantdash - Streaming Pair-Trading Analytics Engine Library
//!
//! Resamples a live tick stream into OHLC bars and derives rolling
//! statistics, spread stationarity and mean-reversion signals for a
//! symbol pair.
//!
//! # Modules
//!
//! - `domain`: Core value types (Tick, Bar, Resolution, RollingWindow)
//! - `engine`: The analytics pipeline (buffer, resampler, returns, rolling
//!   stats, regression, spread, ADF, signal)
//! - `ports`: Trait abstractions (TickFeedPort, TickStorePort)
//! - `adapters`: External implementations (replay/synthetic feeds, CSV
//!   import, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Engine state sharing and the orchestrator loop

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod engine;
pub mod ports;
