//! Ports Layer - Trait definitions for external collaborators
//!
//! The exchange connector, storage layer and dashboard are collaborators;
//! these traits are the seams they plug into.

pub mod market_data;
pub mod mocks;
pub mod persistence;

pub use market_data::{FeedError, TickFeedPort};
pub use mocks::{MockTickFeed, MockTickStore};
pub use persistence::{StoreError, TickStorePort};
