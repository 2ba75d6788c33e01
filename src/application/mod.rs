//! Application Layer - Engine and orchestration
//!
//! Wires the ports and the analytics engine together: the engine owns the
//! shared state and the per-cycle computation, the orchestrator owns the
//! run loop, ingestion task and alert logging.

pub mod engine;
pub mod orchestrator;

pub use engine::{AnalyticsEngine, PairAnalytics, RollingStats};
pub use orchestrator::{AnalyticsOrchestrator, OrchestratorError, OrchestratorStatus};
