//! Outward notification hooks.
//!
//! The core never references any UI type; consumers subscribe to state
//! changes by implementing [`FleetObserver`]. All methods default to
//! no-ops so an observer only implements what it cares about.

use crate::catalog::MineKind;
use crate::tracker::PilotId;

/// A mined event after ore resolution, handed to observers and then
/// immediately folded into aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct MinedEvent {
    pub pilot: PilotId,
    pub ore: String,
    pub units: u64,
    pub volume: f64,
    pub kind: MineKind,
}

/// A compression event after ratio and volume resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionEvent {
    pub pilot: PilotId,
    pub ore: String,
    pub compressed_units: u64,
    pub volume: f64,
}

/// Any event folded into a tracker's aggregates.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackedEvent {
    Mined(MinedEvent),
    Compressed(CompressionEvent),
}

/// Subscription points for external layers (UI, alerts, logging).
///
/// Implementations must be cheap and must not fail; side effects such as
/// sound playback are best-effort by contract.
pub trait FleetObserver {
    /// An event was classified and folded into aggregates.
    fn event_ingested(&mut self, event: &TrackedEvent) {
        let _ = event;
    }

    /// A critical mining event was detected (at most once per batch).
    fn critical_hit(&mut self, event: &MinedEvent) {
        let _ = event;
    }

    /// A pilot's session toggled between Active and Inactive.
    fn session_changed(&mut self, pilot: &PilotId, active: bool) {
        let _ = (pilot, active);
    }

    /// A pilot's active ship profile changed.
    fn profile_changed(&mut self, pilot: &PilotId, active_profile: &str) {
        let _ = (pilot, active_profile);
    }
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl FleetObserver for NoopObserver {}
