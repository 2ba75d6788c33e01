//! Inbound tick feed port.
//!
//! The live exchange connection (and its reconnect/backoff logic) is an
//! external collaborator; the engine only sees typed ticks pushed through
//! a channel.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::Tick;

/// Tick feed errors
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Subscription error: {0}")]
    SubscriptionError(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Push interface delivering trade ticks for a set of symbols
#[async_trait]
pub trait TickFeedPort: Send + Sync {
    /// Subscribe to live ticks for the given symbols.
    /// Returns a channel receiver; the feed closes the channel when it ends.
    async fn subscribe(&self, symbols: &[String]) -> Result<mpsc::Receiver<Tick>, FeedError>;
}
