//! Domain Layer - Core data model for the analytics engine
//!
//! Pure domain types with no external dependencies: ticks, bars, rolling windows.

pub mod bar;
pub mod tick;
pub mod window;

pub use bar::{Bar, Resolution};
pub use tick::Tick;
pub use window::RollingWindow;
