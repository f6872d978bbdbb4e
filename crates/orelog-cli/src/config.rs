//! Configuration loading and management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use orelog_core::catalog::DEFAULT_CRIT_KEYWORD;

/// Hard floor for the poll interval.
pub const MIN_POLL_INTERVAL_MS: u64 = 250;

/// Application configuration.
///
/// Built once at startup and passed to the components that need it;
/// nothing reads configuration after that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory containing the game's chat log files.
    pub log_dir: PathBuf,
    /// Milliseconds between ingestion ticks.
    pub poll_interval_ms: u64,
    /// Default history window in days.
    pub history_days: u32,
    /// Keyword identifying critical mining lines.
    pub crit_keyword: String,
    /// Pilot IDs to track; empty means every discovered pilot.
    pub visible_pilots: Vec<String>,
    /// Ring the terminal bell on a critical hit.
    pub alert_bell: bool,
}

impl Default for Config {
    fn default() -> Self {
        let log_dir = dirs::document_dir()
            .map_or_else(|| PathBuf::from("."), |p| p.join("EVE/logs/Chatlogs"));
        Self {
            log_dir,
            poll_interval_ms: 1000,
            history_days: 15,
            crit_keyword: DEFAULT_CRIT_KEYWORD.to_string(),
            visible_pilots: Vec::new(),
            alert_bell: true,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Absent or corrupt configuration falls back to defaults; a bad
    /// config file must never prevent startup.
    #[must_use]
    pub fn load_from(config_path: Option<&Path>) -> Self {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("ORELOG_"));

        match figment.extract() {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!(%error, "invalid configuration, using defaults");
                Self::default()
            }
        }
    }

    /// The poll interval with the floor applied.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        let ms = if self.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            MIN_POLL_INTERVAL_MS
        } else {
            self.poll_interval_ms
        };
        Duration::from_millis(ms)
    }

    /// Whether a pilot passes the visibility filter.
    #[must_use]
    pub fn is_visible(&self, pilot_id: &str) -> bool {
        self.visible_pilots.is_empty() || self.visible_pilots.iter().any(|p| p == pilot_id)
    }
}

/// Returns the platform-specific config directory for orelog.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("orelog"))
}

/// Returns the platform-specific data directory for orelog.
///
/// On Linux: `~/.local/share/orelog`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("orelog"))
}
