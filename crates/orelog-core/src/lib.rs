//! Core domain logic for the mining log tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Classification: matching raw log lines against the event patterns
//! - Ore reference: unit volumes, grade variants, compression ratios
//! - Tracking: per-pilot aggregates and the session state machine
//! - Rates: theoretical and observed throughput

pub mod catalog;
pub mod fitting;
pub mod hooks;
pub mod ore;
pub mod rate;
mod tracker;

pub use catalog::{Catalog, LineEvent, MineKind};
pub use fitting::{MiningModule, ProfileError, ShipProfiles};
pub use hooks::{CompressionEvent, FleetObserver, MinedEvent, NoopObserver, TrackedEvent};
pub use ore::OreTable;
pub use rate::{actual_rate, theoretical_rate};
pub use tracker::{IdError, PilotId, PilotTracker, TrackerSnapshot};
