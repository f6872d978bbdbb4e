//! Ship fitting profile editing.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};

use orelog_core::fitting::MAX_MODULES;
use orelog_core::{MiningModule, PilotId, ShipProfiles, theoretical_rate};

use crate::cli::ProfileAction;
use crate::commands::util::format_volume;
use crate::store::ProfileStore;

/// Formats one pilot's profiles, active profile first and marked.
#[must_use]
pub fn format_profiles(profiles: &ShipProfiles) -> String {
    let mut output = String::new();
    for name in profiles.names() {
        let marker = if name == profiles.active_name() {
            "*"
        } else {
            " "
        };
        writeln!(output, "{marker} {name}").unwrap();
        let Some(modules) = profiles.modules(name) else {
            continue;
        };
        for (slot, module) in modules.iter().enumerate() {
            let state = if !module.enabled {
                " (disabled)"
            } else if !module.is_configured() {
                " (unconfigured)"
            } else {
                ""
            };
            writeln!(
                output,
                "    [{slot}] {}: {} m3 / {}s{state}",
                module.name, module.yield_per_cycle, module.cycle_time,
            )
            .unwrap();
        }
    }
    writeln!(
        output,
        "theoretical rate: {} m3/hr",
        format_volume(theoretical_rate(profiles.active_modules()) * 3600.0),
    )
    .unwrap();
    output
}

fn set_module(
    profiles: &mut ShipProfiles,
    slot: usize,
    module: MiningModule,
) -> Result<()> {
    if slot >= MAX_MODULES {
        bail!("slot {slot} is out of range (max {MAX_MODULES} modules)");
    }
    let mut modules = profiles.active_modules().to_vec();
    while modules.len() <= slot {
        modules.push(MiningModule {
            name: String::new(),
            yield_per_cycle: 0.0,
            cycle_time: 0.0,
            enabled: false,
        });
    }
    modules[slot] = module;
    profiles.set_active_modules(modules)?;
    Ok(())
}

pub fn run(action: &ProfileAction, store_path: &Path, writer: &mut impl Write) -> Result<()> {
    let pilot_id = match action {
        ProfileAction::List { pilot }
        | ProfileAction::Create { pilot, .. }
        | ProfileAction::Delete { pilot, .. }
        | ProfileAction::Rename { pilot, .. }
        | ProfileAction::Switch { pilot, .. }
        | ProfileAction::SetModule { pilot, .. } => {
            PilotId::new(pilot.clone()).context("invalid pilot ID")?
        }
    };

    let mut store = ProfileStore::load(store_path);
    let profiles = store.profiles_mut(&pilot_id);

    match action {
        ProfileAction::List { .. } => {
            write!(writer, "{}", format_profiles(profiles))?;
            return Ok(());
        }
        ProfileAction::Create { name, .. } => {
            profiles.create(name)?;
            writeln!(writer, "created profile {name:?}")?;
        }
        ProfileAction::Delete { name, .. } => {
            profiles.delete(name)?;
            writeln!(writer, "deleted profile {name:?}")?;
        }
        ProfileAction::Rename { old, new, .. } => {
            profiles.rename(old, new)?;
            writeln!(writer, "renamed profile {old:?} to {new:?}")?;
        }
        ProfileAction::Switch { name, .. } => {
            profiles.switch(name)?;
            writeln!(writer, "active profile is now {name:?}")?;
        }
        ProfileAction::SetModule {
            slot,
            name,
            yield_m3,
            cycle,
            disabled,
            ..
        } => {
            set_module(
                profiles,
                *slot,
                MiningModule {
                    name: name.clone(),
                    yield_per_cycle: *yield_m3,
                    cycle_time: *cycle,
                    enabled: !disabled,
                },
            )?;
            writeln!(writer, "slot {slot} set to {name:?}")?;
        }
    }

    store.save(store_path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn formats_profiles_with_active_marker() {
        let mut profiles = ShipProfiles::default();
        profiles.create("Hulk").unwrap();
        profiles.switch("Hulk").unwrap();
        profiles
            .set_active_modules(vec![
                MiningModule {
                    name: "Strip Miner I".to_string(),
                    yield_per_cycle: 540.0,
                    cycle_time: 180.0,
                    enabled: true,
                },
                MiningModule {
                    name: "Ice Harvester".to_string(),
                    yield_per_cycle: 1000.0,
                    cycle_time: 300.0,
                    enabled: false,
                },
            ])
            .unwrap();

        assert_snapshot!(format_profiles(&profiles), @r"
          Default
        * Hulk
            [0] Strip Miner I: 540 m3 / 180s
            [1] Ice Harvester: 1000 m3 / 300s (disabled)
        theoretical rate: 10,800.0 m3/hr
        ");
    }

    #[test]
    fn edits_persist_through_the_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profiles.json");
        let mut out = Vec::new();

        let create = ProfileAction::Create {
            pilot: "90000001".to_string(),
            name: "Hulk".to_string(),
        };
        run(&create, &path, &mut out).unwrap();

        let switch = ProfileAction::Switch {
            pilot: "90000001".to_string(),
            name: "Hulk".to_string(),
        };
        run(&switch, &path, &mut out).unwrap();

        let store = ProfileStore::load(&path);
        let profiles = store.profiles(&PilotId::new("90000001").unwrap()).unwrap();
        assert_eq!(profiles.active_name(), "Hulk");
    }

    #[test]
    fn rejects_out_of_range_slot() {
        let mut profiles = ShipProfiles::default();
        let module = MiningModule {
            name: "Strip Miner I".to_string(),
            yield_per_cycle: 540.0,
            cycle_time: 180.0,
            enabled: true,
        };
        assert!(set_module(&mut profiles, MAX_MODULES, module).is_err());
    }

    #[test]
    fn invalid_pilot_id_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profiles.json");
        let action = ProfileAction::List {
            pilot: "not-a-number".to_string(),
        };
        assert!(run(&action, &path, &mut Vec::new()).is_err());
        assert!(!path.exists());
    }
}
