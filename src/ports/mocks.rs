use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::market_data::{FeedError, TickFeedPort};
use super::persistence::{StoreError, TickStorePort};
use crate::domain::{Bar, Tick};

/// Mock tick feed that replays a fixed tick list and records subscriptions
#[derive(Debug, Default)]
pub struct MockTickFeed {
    ticks: Vec<Tick>,
    subscriptions: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockTickFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to seed the ticks delivered on subscribe
    pub fn with_ticks(mut self, ticks: Vec<Tick>) -> Self {
        self.ticks = ticks;
        self
    }

    /// Get all recorded subscription calls
    pub fn get_subscriptions(&self) -> Vec<Vec<String>> {
        self.subscriptions.lock().unwrap().clone()
    }
}

#[async_trait]
impl TickFeedPort for MockTickFeed {
    async fn subscribe(&self, symbols: &[String]) -> Result<mpsc::Receiver<Tick>, FeedError> {
        self.subscriptions.lock().unwrap().push(symbols.to_vec());

        let (tx, rx) = mpsc::channel(self.ticks.len().max(1));
        for tick in self.ticks.clone() {
            tx.send(tick)
                .await
                .map_err(|e| FeedError::ConnectionError(e.to_string()))?;
        }
        Ok(rx)
    }
}

/// Mock tick store that records stored bars and serves seeded history
#[derive(Debug, Default)]
pub struct MockTickStore {
    history: Vec<Tick>,
    stored_bars: Arc<Mutex<Vec<Bar>>>,
}

impl MockTickStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to seed historical ticks
    pub fn with_history(mut self, ticks: Vec<Tick>) -> Self {
        self.history = ticks;
        self
    }

    /// Get all bars emitted for storage
    pub fn get_stored_bars(&self) -> Vec<Bar> {
        self.stored_bars.lock().unwrap().clone()
    }
}

#[async_trait]
impl TickStorePort for MockTickStore {
    async fn historical_ticks(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Tick>, StoreError> {
        Ok(self
            .history
            .iter()
            .filter(|t| t.symbol == symbol && t.timestamp >= from && t.timestamp < to)
            .cloned()
            .collect())
    }

    async fn store_bar(&self, bar: &Bar) -> Result<(), StoreError> {
        self.stored_bars.lock().unwrap().push(bar.clone());
        Ok(())
    }
}
