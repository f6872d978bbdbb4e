//! On-disk persistence for ship fitting profiles.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use orelog_core::{PilotId, ShipProfiles};

use crate::config::dirs_data_path;

/// Per-pilot ship profiles, stored as one JSON file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProfileStore {
    pub pilots: BTreeMap<PilotId, ShipProfiles>,
}

impl ProfileStore {
    /// Loads the store, treating a missing or corrupt file as empty.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let Ok(bytes) = fs::read(path) else {
            return Self::default();
        };
        match serde_json::from_slice::<Self>(&bytes) {
            Ok(mut store) => {
                for profiles in store.pilots.values_mut() {
                    profiles.ensure_valid();
                }
                store
            }
            Err(error) => {
                tracing::warn!(path = ?path, %error, "corrupt profile store, starting empty");
                Self::default()
            }
        }
    }

    /// Writes the store, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// The profiles for one pilot, created on first access.
    pub fn profiles_mut(&mut self, pilot: &PilotId) -> &mut ShipProfiles {
        self.pilots.entry(pilot.clone()).or_default()
    }

    #[must_use]
    pub fn profiles(&self, pilot: &PilotId) -> Option<&ShipProfiles> {
        self.pilots.get(pilot)
    }
}

/// Default location of the profile store.
#[must_use]
pub fn default_store_path() -> PathBuf {
    dirs_data_path()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("profiles.json")
}

#[cfg(test)]
mod tests {
    use orelog_core::MiningModule;
    use tempfile::TempDir;

    use super::*;

    fn pilot() -> PilotId {
        PilotId::new("90000001").unwrap()
    }

    #[test]
    fn missing_file_loads_empty() {
        let store = ProfileStore::load(Path::new("/nonexistent/profiles.json"));
        assert!(store.pilots.is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profiles.json");
        fs::write(&path, "{not json").unwrap();
        assert!(ProfileStore::load(&path).pilots.is_empty());
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/profiles.json");

        let mut store = ProfileStore::default();
        let profiles = store.profiles_mut(&pilot());
        profiles.create("Hulk").unwrap();
        profiles.switch("Hulk").unwrap();
        profiles
            .set_active_modules(vec![MiningModule {
                name: "Strip Miner I".to_string(),
                yield_per_cycle: 540.0,
                cycle_time: 180.0,
                enabled: true,
            }])
            .unwrap();
        store.save(&path).unwrap();

        let loaded = ProfileStore::load(&path);
        let profiles = loaded.profiles(&pilot()).unwrap();
        assert_eq!(profiles.active_name(), "Hulk");
        assert_eq!(profiles.active_modules().len(), 1);
    }
}
