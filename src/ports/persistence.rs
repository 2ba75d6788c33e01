//! Persistence port.
//!
//! The storage layer is an external collaborator. The engine may consult it
//! once at startup to backfill the tick buffer, and emits closed bars
//! outward for durable storage; it never implements storage itself.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{Bar, Tick};

/// Storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Read error: {0}")]
    ReadError(String),

    #[error("Write error: {0}")]
    WriteError(String),
}

/// Read-through historical store plus outward bar sink
#[async_trait]
pub trait TickStorePort: Send + Sync {
    /// Historical ticks for startup backfill, oldest first
    async fn historical_ticks(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Tick>, StoreError>;

    /// Emit a closed bar for durable storage
    async fn store_bar(&self, bar: &Bar) -> Result<(), StoreError>;
}
