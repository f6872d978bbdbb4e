//! Day-windowed history reports.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use orelog_core::{Catalog, PilotId};
use orelog_ingest::{HistoryReport, Locator, aggregate_history};

use crate::commands::util::format_volume;
use crate::config::Config;

/// Output shape selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Summary,
    Daily,
    Pivot,
}

fn display_name<'a>(names: &'a BTreeMap<PilotId, String>, pilot: &'a PilotId) -> &'a str {
    names.get(pilot).map_or_else(|| pilot.as_str(), String::as_str)
}

/// Per-pilot, per-ore summary with a combined header.
#[must_use]
pub fn format_summary(report: &HistoryReport, names: &BTreeMap<PilotId, String>) -> String {
    let mut output = String::new();
    writeln!(
        output,
        "MINING HISTORY: last {} days",
        report.window_days
    )
    .unwrap();
    writeln!(output).unwrap();
    writeln!(
        output,
        "ALL PILOTS: {} m3",
        format_volume(report.combined_total())
    )
    .unwrap();

    for (pilot, ores) in &report.per_ore {
        writeln!(output).unwrap();
        writeln!(
            output,
            "{} ({}): {} m3",
            display_name(names, pilot),
            pilot,
            format_volume(report.pilot_total(pilot)),
        )
        .unwrap();

        let mut sorted: Vec<_> = ores.iter().collect();
        sorted.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
        for (ore, volume) in sorted {
            writeln!(output, "  {ore}: {} m3", format_volume(*volume)).unwrap();
        }
    }

    if report.per_ore.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No mining data in the window.").unwrap();
    }
    output
}

/// Per-pilot daily breakdown.
#[must_use]
pub fn format_daily(report: &HistoryReport, names: &BTreeMap<PilotId, String>) -> String {
    let mut output = String::new();
    writeln!(
        output,
        "DAILY MINING HISTORY: last {} days",
        report.window_days
    )
    .unwrap();

    for (pilot, days) in &report.daily {
        writeln!(output).unwrap();
        writeln!(output, "{} ({})", display_name(names, pilot), pilot).unwrap();
        for (date, ores) in days {
            let day_total: f64 = ores.values().sum();
            writeln!(output, "  {date}: {} m3", format_volume(day_total)).unwrap();
            for (ore, volume) in ores {
                writeln!(output, "    {ore}: {} m3", format_volume(*volume)).unwrap();
            }
        }
    }

    if report.daily.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No dated mining data in the window.").unwrap();
    }
    output
}

/// Ore-by-pilot table.
#[must_use]
pub fn format_pivot(report: &HistoryReport, names: &BTreeMap<PilotId, String>) -> String {
    let mut output = String::new();
    writeln!(
        output,
        "ORE BY PILOT: last {} days",
        report.window_days
    )
    .unwrap();
    writeln!(output).unwrap();

    let pilots: Vec<&PilotId> = report.per_ore.keys().collect();
    write!(output, "{:<24}", "ORE").unwrap();
    for pilot in &pilots {
        write!(output, " {:>14}", display_name(names, pilot)).unwrap();
    }
    writeln!(output, " {:>14}", "TOTAL").unwrap();

    for (ore, per_pilot) in report.pivot() {
        write!(output, "{ore:<24}").unwrap();
        let mut row_total = 0.0;
        for pilot in &pilots {
            let volume = per_pilot.get(*pilot).copied().unwrap_or(0.0);
            row_total += volume;
            write!(output, " {:>14}", format_volume(volume)).unwrap();
        }
        writeln!(output, " {:>14}", format_volume(row_total)).unwrap();
    }

    write!(output, "{:<24}", "TOTAL").unwrap();
    for pilot in &pilots {
        write!(output, " {:>14}", format_volume(report.pilot_total(pilot))).unwrap();
    }
    writeln!(output, " {:>14}", format_volume(report.combined_total())).unwrap();
    output
}

/// Runs the scan off the async runtime's worker threads; large log
/// directories can take a while.
pub async fn run(
    config: &Config,
    days: Option<u32>,
    view: View,
    json: bool,
    writer: &mut impl Write,
) -> Result<()> {
    let log_dir = config.log_dir.clone();
    let window = days.unwrap_or(config.history_days);
    let catalog = Catalog::new(&config.crit_keyword);
    let report =
        tokio::task::spawn_blocking(move || aggregate_history(&log_dir, window, &catalog)).await?;

    let names: BTreeMap<PilotId, String> = Locator::new(&config.log_dir)
        .discover()
        .into_iter()
        .filter_map(|p| p.name.map(|name| (p.id, name)))
        .collect();

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }
    let text = match view {
        View::Summary => format_summary(&report, &names),
        View::Daily => format_daily(&report, &names),
        View::Pivot => format_pivot(&report, &names),
    };
    write!(writer, "{text}")?;
    Ok(())
}
