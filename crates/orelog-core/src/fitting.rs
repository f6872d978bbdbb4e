//! Ship fitting: mining modules and named module profiles.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of mining module slots per profile.
pub const MAX_MODULES: usize = 5;

/// Name of the profile every pilot starts with.
pub const DEFAULT_PROFILE: &str = "Default";

/// Profile edits rejected at the boundary. State is unchanged on error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("profile name cannot be empty")]
    EmptyName,

    #[error("profile already exists: {0}")]
    Duplicate(String),

    #[error("no such profile: {0}")]
    Unknown(String),

    #[error("cannot delete the only profile")]
    LastProfile,

    #[error("too many modules: {got} (max {MAX_MODULES})")]
    TooManyModules { got: usize },
}

/// One mining module slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningModule {
    pub name: String,
    pub yield_per_cycle: f64,
    pub cycle_time: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

impl MiningModule {
    /// A module counts toward throughput only when both figures are set.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.yield_per_cycle > 0.0 && self.cycle_time > 0.0
    }

    /// Throughput of this module in m3 per second, 0.0 if unconfigured.
    #[must_use]
    pub fn m3_per_sec(&self) -> f64 {
        if self.is_configured() {
            self.yield_per_cycle / self.cycle_time
        } else {
            0.0
        }
    }
}

/// Named module profiles for one pilot.
///
/// Invariants: at least one profile always exists, and the active name
/// always refers to an existing profile. All mutators preserve these;
/// [`ShipProfiles::ensure_valid`] repairs data deserialized from an
/// external store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipProfiles {
    profiles: BTreeMap<String, Vec<MiningModule>>,
    active: String,
}

impl Default for ShipProfiles {
    fn default() -> Self {
        Self {
            profiles: BTreeMap::from([(DEFAULT_PROFILE.to_string(), Vec::new())]),
            active: DEFAULT_PROFILE.to_string(),
        }
    }
}

impl ShipProfiles {
    /// Name of the active profile.
    #[must_use]
    pub fn active_name(&self) -> &str {
        &self.active
    }

    /// All profile names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Modules of the active profile.
    #[must_use]
    pub fn active_modules(&self) -> &[MiningModule] {
        self.profiles
            .get(&self.active)
            .map_or(&[], Vec::as_slice)
    }

    /// Modules of a named profile, if it exists.
    #[must_use]
    pub fn modules(&self, name: &str) -> Option<&[MiningModule]> {
        self.profiles.get(name).map(Vec::as_slice)
    }

    /// Replaces the active profile's module list.
    pub fn set_active_modules(&mut self, modules: Vec<MiningModule>) -> Result<(), ProfileError> {
        if modules.len() > MAX_MODULES {
            return Err(ProfileError::TooManyModules { got: modules.len() });
        }
        self.profiles.insert(self.active.clone(), modules);
        Ok(())
    }

    /// Creates a new empty profile.
    pub fn create(&mut self, name: &str) -> Result<(), ProfileError> {
        if name.is_empty() {
            return Err(ProfileError::EmptyName);
        }
        if self.profiles.contains_key(name) {
            return Err(ProfileError::Duplicate(name.to_string()));
        }
        self.profiles.insert(name.to_string(), Vec::new());
        Ok(())
    }

    /// Deletes a profile. The last remaining profile cannot be deleted;
    /// deleting the active profile switches to another one first.
    pub fn delete(&mut self, name: &str) -> Result<(), ProfileError> {
        if !self.profiles.contains_key(name) {
            return Err(ProfileError::Unknown(name.to_string()));
        }
        if self.profiles.len() == 1 {
            return Err(ProfileError::LastProfile);
        }
        if self.active == name {
            let replacement = self
                .profiles
                .keys()
                .find(|k| k.as_str() != name)
                .cloned()
                .ok_or(ProfileError::LastProfile)?;
            self.active = replacement;
        }
        self.profiles.remove(name);
        Ok(())
    }

    /// Renames a profile, following the active name along.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), ProfileError> {
        if new.is_empty() {
            return Err(ProfileError::EmptyName);
        }
        if self.profiles.contains_key(new) {
            return Err(ProfileError::Duplicate(new.to_string()));
        }
        let modules = self
            .profiles
            .remove(old)
            .ok_or_else(|| ProfileError::Unknown(old.to_string()))?;
        self.profiles.insert(new.to_string(), modules);
        if self.active == old {
            self.active = new.to_string();
        }
        Ok(())
    }

    /// Switches the active profile.
    pub fn switch(&mut self, name: &str) -> Result<(), ProfileError> {
        if !self.profiles.contains_key(name) {
            return Err(ProfileError::Unknown(name.to_string()));
        }
        self.active = name.to_string();
        Ok(())
    }

    /// Repairs profiles loaded from an external store so the invariants
    /// hold: an empty map gets a default profile, a dangling active name
    /// is pointed at an existing profile.
    pub fn ensure_valid(&mut self) {
        if self.profiles.is_empty() {
            self.profiles
                .insert(DEFAULT_PROFILE.to_string(), Vec::new());
            self.active = DEFAULT_PROFILE.to_string();
        }
        if !self.profiles.contains_key(&self.active) {
            if let Some(first) = self.profiles.keys().next().cloned() {
                tracing::warn!(
                    dangling = %self.active,
                    replacement = %first,
                    "active profile missing, switching"
                );
                self.active = first;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(yield_per_cycle: f64, cycle_time: f64, enabled: bool) -> MiningModule {
        MiningModule {
            name: "Strip Miner I".to_string(),
            yield_per_cycle,
            cycle_time,
            enabled,
        }
    }

    #[test]
    fn configured_requires_both_figures() {
        assert!(module(100.0, 60.0, true).is_configured());
        assert!(!module(0.0, 60.0, true).is_configured());
        assert!(!module(100.0, 0.0, true).is_configured());
    }

    #[test]
    fn module_throughput() {
        let m = module(100.0, 60.0, true);
        assert!((m.m3_per_sec() - 100.0 / 60.0).abs() < 1e-9);
        assert!((module(0.0, 0.0, true).m3_per_sec()).abs() < f64::EPSILON);
    }

    #[test]
    fn default_has_one_profile() {
        let p = ShipProfiles::default();
        assert_eq!(p.active_name(), DEFAULT_PROFILE);
        assert_eq!(p.names().count(), 1);
        assert!(p.active_modules().is_empty());
    }

    #[test]
    fn cannot_delete_only_profile() {
        let mut p = ShipProfiles::default();
        assert_eq!(p.delete(DEFAULT_PROFILE), Err(ProfileError::LastProfile));
        assert_eq!(p.names().count(), 1);
    }

    #[test]
    fn deleting_active_switches_first() {
        let mut p = ShipProfiles::default();
        p.create("Orca").unwrap();
        p.switch("Orca").unwrap();
        p.delete("Orca").unwrap();
        assert_eq!(p.active_name(), DEFAULT_PROFILE);
        assert_eq!(p.names().count(), 1);
    }

    #[test]
    fn rename_to_existing_rejected() {
        let mut p = ShipProfiles::default();
        p.create("Orca").unwrap();
        assert_eq!(
            p.rename("Orca", DEFAULT_PROFILE),
            Err(ProfileError::Duplicate(DEFAULT_PROFILE.to_string()))
        );
        // State unchanged.
        assert!(p.modules("Orca").is_some());
    }

    #[test]
    fn rename_follows_active() {
        let mut p = ShipProfiles::default();
        p.rename(DEFAULT_PROFILE, "Hulk").unwrap();
        assert_eq!(p.active_name(), "Hulk");
    }

    #[test]
    fn create_empty_name_rejected() {
        let mut p = ShipProfiles::default();
        assert_eq!(p.create(""), Err(ProfileError::EmptyName));
    }

    #[test]
    fn create_duplicate_rejected() {
        let mut p = ShipProfiles::default();
        assert_eq!(
            p.create(DEFAULT_PROFILE),
            Err(ProfileError::Duplicate(DEFAULT_PROFILE.to_string()))
        );
    }

    #[test]
    fn switch_unknown_rejected() {
        let mut p = ShipProfiles::default();
        assert_eq!(
            p.switch("Nope"),
            Err(ProfileError::Unknown("Nope".to_string()))
        );
        assert_eq!(p.active_name(), DEFAULT_PROFILE);
    }

    #[test]
    fn module_cap_enforced() {
        let mut p = ShipProfiles::default();
        let too_many = vec![module(10.0, 5.0, true); MAX_MODULES + 1];
        assert_eq!(
            p.set_active_modules(too_many),
            Err(ProfileError::TooManyModules { got: MAX_MODULES + 1 })
        );
        assert!(p.active_modules().is_empty());
    }

    #[test]
    fn ensure_valid_repairs_dangling_active() {
        let mut p: ShipProfiles = serde_json::from_str(
            r#"{"profiles":{"Hulk":[]},"active":"Gone"}"#,
        )
        .unwrap();
        p.ensure_valid();
        assert_eq!(p.active_name(), "Hulk");
    }

    #[test]
    fn ensure_valid_repairs_empty_map() {
        let mut p: ShipProfiles =
            serde_json::from_str(r#"{"profiles":{},"active":""}"#).unwrap();
        p.ensure_valid();
        assert_eq!(p.active_name(), DEFAULT_PROFILE);
    }
}
