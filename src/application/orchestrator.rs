//! Analytics Orchestrator
//!
//! Coordinates the tick feed with the analytics engine. One task drains the
//! feed into the engine as ticks arrive; the main loop runs a computation
//! cycle every poll interval and logs the resulting signal and alerts.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::application::engine::{AnalyticsEngine, PairAnalytics};
use crate::engine::signal::AlertMonitor;
use crate::engine::tick_buffer::IngestError;
use crate::ports::{FeedError, StoreError, TickFeedPort, TickStorePort};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Feed error: {0}")]
    FeedError(#[from] FeedError),
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
}

/// Status snapshot of the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorStatus {
    pub is_running: bool,
    pub pair: (String, String),
    pub last_cycle: Option<PairAnalytics>,
}

/// Main analytics orchestrator coordinating feed, engine and alerts
#[derive(Clone)]
pub struct AnalyticsOrchestrator {
    engine: Arc<AnalyticsEngine>,
    feed: Arc<dyn TickFeedPort>,
    store: Option<Arc<dyn TickStorePort>>,
    is_running: Arc<RwLock<bool>>,
    last_cycle: Arc<RwLock<Option<PairAnalytics>>>,
    alerts: Arc<RwLock<AlertMonitor>>,
    poll_interval: std::time::Duration,
}

impl AnalyticsOrchestrator {
    pub fn new(engine: Arc<AnalyticsEngine>, feed: Arc<dyn TickFeedPort>) -> Self {
        let threshold = engine.config().z_threshold;

        Self {
            engine,
            feed,
            store: None,
            is_running: Arc::new(RwLock::new(false)),
            last_cycle: Arc::new(RwLock::new(None)),
            alerts: Arc::new(RwLock::new(AlertMonitor::new(threshold))),
            poll_interval: std::time::Duration::from_secs(5),
        }
    }

    /// Attach a store for backfill and closed-bar persistence
    pub fn with_store(mut self, store: Arc<dyn TickStorePort>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set custom poll interval
    pub fn with_poll_interval(mut self, interval: std::time::Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn engine(&self) -> &Arc<AnalyticsEngine> {
        &self.engine
    }

    /// Replay historical ticks through the engine before going live.
    ///
    /// Replay and live ingestion share the skew policy, so a backfill
    /// followed by live ticks behaves like one continuous stream.
    pub async fn backfill(
        &self,
        from: chrono::DateTime<chrono::Utc>,
        to: chrono::DateTime<chrono::Utc>,
    ) -> Result<usize, OrchestratorError> {
        let Some(store) = &self.store else {
            return Ok(0);
        };

        let (symbol_a, symbol_b) = self.engine.pair();
        let mut ticks = store.historical_ticks(symbol_a, from, to).await?;
        ticks.extend(store.historical_ticks(symbol_b, from, to).await?);
        ticks.sort_by_key(|t| t.timestamp);

        let mut ingested = 0;
        for tick in ticks {
            match self.engine.ingest(tick).await {
                Ok(_) => ingested += 1,
                Err(IngestError::OutOfOrder { symbol, .. }) => {
                    tracing::warn!("Backfill tick for {} out of order, skipped", symbol);
                }
                Err(e) => tracing::warn!("Backfill tick rejected: {}", e),
            }
        }

        tracing::info!("Backfilled {} ticks for {}/{}", ingested, symbol_a, symbol_b);
        Ok(ingested)
    }

    /// Run the main analytics loop until `stop` is called
    pub async fn run(&self) -> Result<(), OrchestratorError> {
        *self.is_running.write().await = true;

        let (symbol_a, symbol_b) = self.engine.pair();
        let symbols = vec![symbol_a.to_string(), symbol_b.to_string()];

        tracing::info!(
            "Starting analytics orchestrator - Pair: {}/{}, Poll interval: {:?}",
            symbol_a,
            symbol_b,
            self.poll_interval
        );

        let mut rx = self.feed.subscribe(&symbols).await?;

        // Ingestion task: drain the feed into the engine, persist closed bars
        let engine = Arc::clone(&self.engine);
        let store = self.store.clone();
        let running = Arc::clone(&self.is_running);
        let ingest_task = tokio::spawn(async move {
            while let Some(tick) = rx.recv().await {
                if !*running.read().await {
                    break;
                }
                match engine.ingest(tick).await {
                    Ok(closed) => {
                        if let Some(store) = &store {
                            for bar in &closed {
                                if let Err(e) = store.store_bar(bar).await {
                                    tracing::warn!("Failed to persist bar: {}", e);
                                }
                            }
                        }
                    }
                    Err(e) => tracing::warn!("Tick rejected: {}", e),
                }
            }
        });

        while *self.is_running.read().await {
            self.tick().await;
            tokio::time::sleep(self.poll_interval).await;
        }

        ingest_task.abort();
        tracing::info!("Analytics orchestrator stopped");
        Ok(())
    }

    /// Execute one computation cycle and log the outcome
    pub async fn tick(&self) {
        let analytics = self.engine.compute_cycle().await;

        match analytics.signal.z_score {
            Some(z) => tracing::info!(
                "{}/{} | Spread z: {:.2} | Regime: {} | Action: {:?}",
                self.engine.pair().0,
                self.engine.pair().1,
                z,
                analytics.signal.regime,
                analytics.signal.action
            ),
            None => tracing::info!(
                "{}/{} | Warming up ({})",
                self.engine.pair().0,
                self.engine.pair().1,
                analytics.signal.regime
            ),
        }

        let event = self
            .alerts
            .write()
            .await
            .observe(analytics.timestamp, analytics.signal.z_score);
        if let Some(alert) = event {
            if alert.entered {
                tracing::info!(
                    "ALERT: spread z-score {:.2} crossed the trade band",
                    alert.z_score
                );
            } else {
                tracing::info!(
                    "ALERT cleared: spread z-score {:.2} back inside the band",
                    alert.z_score
                );
            }
        }

        *self.last_cycle.write().await = Some(analytics);
    }

    /// Stop the analytics loop
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
        tracing::info!("Stop signal sent to orchestrator");
    }

    /// Get current status snapshot
    pub async fn status(&self) -> OrchestratorStatus {
        let (a, b) = self.engine.pair();
        OrchestratorStatus {
            is_running: *self.is_running.read().await,
            pair: (a.to_string(), b.to_string()),
            last_cycle: self.last_cycle.read().await.clone(),
        }
    }
}
