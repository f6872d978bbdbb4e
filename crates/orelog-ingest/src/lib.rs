//! Filesystem-facing half of the mining log tracker.
//!
//! This crate contains:
//! - Discovery: finding log files and mapping them to pilots
//! - Polling: the incremental tail-and-fold loop over live logs
//! - History: stateless day-windowed re-aggregation

pub mod history;
pub mod locator;
pub mod poller;

pub use history::{HistoryReport, aggregate_history, max_window_days};
pub use locator::{DiscoveredPilot, Locator, LogSource, pilot_id_from_path, scan_log_dir};
pub use poller::{PollError, Poller};
