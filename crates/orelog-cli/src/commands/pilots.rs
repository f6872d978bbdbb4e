//! Pilot discovery listing.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use orelog_ingest::{DiscoveredPilot, Locator};

use crate::config::Config;

#[derive(Debug, Serialize)]
struct PilotRow<'a> {
    id: &'a str,
    name: Option<&'a str>,
    files: usize,
    visible: bool,
}

/// Formats the text listing.
#[must_use]
pub fn format_pilots(pilots: &[DiscoveredPilot], config: &Config) -> String {
    let mut output = String::new();
    if pilots.is_empty() {
        writeln!(output, "No pilot logs found in {}", config.log_dir.display()).unwrap();
        return output;
    }

    writeln!(output, "{:<12} {:<24} {:>5}  VISIBLE", "ID", "NAME", "FILES").unwrap();
    for pilot in pilots {
        let visible = if config.is_visible(pilot.id.as_str()) {
            "yes"
        } else {
            "no"
        };
        writeln!(
            output,
            "{:<12} {:<24} {:>5}  {visible}",
            pilot.id.as_str(),
            pilot.name.as_deref().unwrap_or("(unknown)"),
            pilot.file_count,
        )
        .unwrap();
    }
    output
}

pub fn run(config: &Config, json: bool, writer: &mut impl Write) -> Result<()> {
    let mut locator = Locator::new(&config.log_dir);
    let pilots = locator.discover();

    if json {
        let rows: Vec<PilotRow<'_>> = pilots
            .iter()
            .map(|p| PilotRow {
                id: p.id.as_str(),
                name: p.name.as_deref(),
                files: p.file_count,
                visible: config.is_visible(p.id.as_str()),
            })
            .collect();
        writeln!(writer, "{}", serde_json::to_string_pretty(&rows)?)?;
    } else {
        write!(writer, "{}", format_pilots(&pilots, config))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use orelog_core::PilotId;

    use super::*;

    fn discovered(id: &str, name: Option<&str>, files: usize) -> DiscoveredPilot {
        DiscoveredPilot {
            id: PilotId::new(id).unwrap(),
            name: name.map(String::from),
            file_count: files,
        }
    }

    #[test]
    fn lists_pilots_with_visibility() {
        let pilots = vec![
            discovered("90000002", Some("Busy Pilot"), 3),
            discovered("90000001", None, 1),
        ];
        let config = Config {
            visible_pilots: vec!["90000002".to_string()],
            ..Config::default()
        };
        assert_snapshot!(format_pilots(&pilots, &config), @r"
        ID           NAME                     FILES  VISIBLE
        90000002     Busy Pilot                   3  yes
        90000001     (unknown)                    1  no
        ");
    }

    #[test]
    fn empty_discovery_prints_hint() {
        let config = Config {
            log_dir: "/tmp/none".into(),
            ..Config::default()
        };
        assert_snapshot!(format_pilots(&[], &config), @"No pilot logs found in /tmp/none");
    }
}
