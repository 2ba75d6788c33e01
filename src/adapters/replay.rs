//! Replay and synthetic tick feeds.
//!
//! `ReplayFeed` pushes a recorded tick list through the feed port, useful
//! for demos and offline runs. `SyntheticFeed` generates a correlated
//! random-walk pair at a fixed tick interval so the full pipeline can be
//! exercised without an exchange connection.

use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

use crate::domain::Tick;
use crate::ports::market_data::{FeedError, TickFeedPort};

/// Replays a pre-recorded tick sequence, optionally paced in real time
pub struct ReplayFeed {
    ticks: Vec<Tick>,
    /// Delay between ticks; zero replays as fast as the channel drains
    pacing: Duration,
}

impl ReplayFeed {
    pub fn new(ticks: Vec<Tick>) -> Self {
        Self {
            ticks,
            pacing: Duration::ZERO,
        }
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }
}

#[async_trait]
impl TickFeedPort for ReplayFeed {
    async fn subscribe(&self, symbols: &[String]) -> Result<mpsc::Receiver<Tick>, FeedError> {
        let wanted: Vec<String> = symbols.to_vec();
        let ticks: Vec<Tick> = self
            .ticks
            .iter()
            .filter(|t| wanted.contains(&t.symbol))
            .cloned()
            .collect();

        info!(count = ticks.len(), "replay feed subscribed");

        let pacing = self.pacing;
        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(async move {
            for tick in ticks {
                if tx.send(tick).await.is_err() {
                    break;
                }
                if !pacing.is_zero() {
                    tokio::time::sleep(pacing).await;
                }
            }
            // Channel closes when tx drops; the consumer sees the end of stream
        });

        Ok(rx)
    }
}

/// Generates a correlated random-walk pair for live-style demo runs
pub struct SyntheticFeed {
    seed: u64,
    tick_interval: Duration,
    base_price: f64,
}

impl SyntheticFeed {
    pub fn new(seed: u64, tick_interval: Duration) -> Self {
        Self {
            seed,
            tick_interval,
            base_price: 100.0,
        }
    }
}

#[async_trait]
impl TickFeedPort for SyntheticFeed {
    async fn subscribe(&self, symbols: &[String]) -> Result<mpsc::Receiver<Tick>, FeedError> {
        if symbols.len() < 2 {
            return Err(FeedError::SubscriptionError(
                "synthetic feed needs a symbol pair".to_string(),
            ));
        }

        let symbol_a = symbols[0].clone();
        let symbol_b = symbols[1].clone();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let interval = self.tick_interval;
        let mut price_a = self.base_price;
        let mut price_b = self.base_price / 2.0;

        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(async move {
            loop {
                // Common factor keeps the legs correlated; idiosyncratic
                // noise keeps the spread moving
                let common: f64 = rng.gen_range(-0.1..0.1);
                price_a = (price_a + common + rng.gen_range(-0.05..0.05)).max(1.0);
                price_b = (price_b + common / 2.0 + rng.gen_range(-0.03..0.03)).max(1.0);

                let now = Utc::now();
                let qty_a = rng.gen_range(0.01..2.0);
                let qty_b = rng.gen_range(0.01..2.0);

                if tx.send(Tick::new(now, symbol_a.clone(), price_a, qty_a)).await.is_err() {
                    break;
                }
                if tx.send(Tick::new(now, symbol_b.clone(), price_b, qty_b)).await.is_err() {
                    break;
                }

                tokio::time::sleep(interval).await;
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tick(secs: i64, symbol: &str, price: f64) -> Tick {
        Tick::new(Utc.timestamp_opt(secs, 0).unwrap(), symbol, price, 1.0)
    }

    #[tokio::test]
    async fn test_replay_delivers_all_ticks_in_order() {
        let ticks = vec![
            tick(0, "btcusdt", 100.0),
            tick(1, "btcusdt", 101.0),
            tick(2, "btcusdt", 102.0),
        ];
        let feed = ReplayFeed::new(ticks.clone());
        let mut rx = feed.subscribe(&["btcusdt".to_string()]).await.unwrap();

        let mut received = Vec::new();
        while let Some(t) = rx.recv().await {
            received.push(t);
        }
        assert_eq!(received, ticks);
    }

    #[tokio::test]
    async fn test_replay_filters_unwanted_symbols() {
        let feed = ReplayFeed::new(vec![
            tick(0, "btcusdt", 100.0),
            tick(0, "dogeusdt", 0.1),
        ]);
        let mut rx = feed.subscribe(&["btcusdt".to_string()]).await.unwrap();

        let mut received = Vec::new();
        while let Some(t) = rx.recv().await {
            received.push(t);
        }
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].symbol, "btcusdt");
    }

    #[tokio::test]
    async fn test_synthetic_produces_valid_pair_ticks() {
        let feed = SyntheticFeed::new(42, Duration::from_millis(1));
        let mut rx = feed
            .subscribe(&["btcusdt".to_string(), "ethusdt".to_string()])
            .await
            .unwrap();

        let mut count = 0;
        while count < 10 {
            let t = rx.recv().await.unwrap();
            assert!(t.is_valid());
            assert!(t.symbol == "btcusdt" || t.symbol == "ethusdt");
            count += 1;
        }
    }

    #[tokio::test]
    async fn test_synthetic_requires_pair() {
        let feed = SyntheticFeed::new(42, Duration::from_millis(1));
        let result = feed.subscribe(&["btcusdt".to_string()]).await;
        assert!(matches!(result, Err(FeedError::SubscriptionError(_))));
    }
}
