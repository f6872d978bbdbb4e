//! Throughput math for a pilot's session.

use chrono::{DateTime, Utc};

use crate::fitting::MiningModule;
use crate::tracker::PilotTracker;

/// Actual-rate readings younger than this are reported as zero. Early
/// samples divide a tiny volume by a tiny elapsed time and swing wildly.
pub const RATE_DEBOUNCE_SECS: f64 = 10.0;

/// Volume per second the active fitting can sustain. Disabled and
/// unconfigured slots contribute nothing.
#[must_use]
pub fn theoretical_rate(modules: &[MiningModule]) -> f64 {
    modules
        .iter()
        .filter(|m| m.enabled && m.is_configured())
        .map(MiningModule::m3_per_sec)
        .sum()
}

/// Observed volume per second since the session baseline, or zero
/// inside the debounce window. Only meaningful while the session is
/// Active; callers gate on that.
#[must_use]
pub fn actual_rate(tracker: &PilotTracker, now: DateTime<Utc>) -> f64 {
    let elapsed = (now - tracker.session_start())
        .to_std()
        .map_or(0.0, |d| d.as_secs_f64());
    if elapsed <= RATE_DEBOUNCE_SECS {
        return 0.0;
    }
    tracker.session_m3() / elapsed
}
