//! Stateless day-windowed re-aggregation of log files.
//!
//! Everything here is a pure function of file contents at call time. The
//! live poller's offsets are never read or written, so a history scan can
//! run concurrently with ingestion.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use std::time::SystemTime;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use rayon::prelude::*;
use regex::Regex;

use orelog_core::{Catalog, LineEvent, OreTable, PilotId};

use crate::locator::{LogSource, scan_log_dir};

static LOG_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[\s*(\d{4}\.\d{2}\.\d{2})\s+\d{2}:\d{2}:\d{2}\s*\]").expect("valid timestamp pattern")
});

/// Day-windowed aggregates over every pilot's log files.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct HistoryReport {
    /// The window actually used after clamping.
    pub window_days: u32,
    /// pilot -> ore -> volume.
    pub per_ore: BTreeMap<PilotId, BTreeMap<String, f64>>,
    /// pilot -> date -> ore -> volume. Lines without a parseable
    /// timestamp are missing here but still counted in `per_ore`.
    pub daily: BTreeMap<PilotId, BTreeMap<NaiveDate, BTreeMap<String, f64>>>,
}

impl HistoryReport {
    #[must_use]
    pub fn pilot_total(&self, pilot: &PilotId) -> f64 {
        self.per_ore
            .get(pilot)
            .map_or(0.0, |ores| ores.values().sum())
    }

    #[must_use]
    pub fn combined_total(&self) -> f64 {
        self.per_ore
            .values()
            .flat_map(BTreeMap::values)
            .sum()
    }

    /// All ore names present in the window, sorted.
    #[must_use]
    pub fn ore_names(&self) -> BTreeSet<String> {
        self.per_ore
            .values()
            .flat_map(BTreeMap::keys)
            .cloned()
            .collect()
    }

    /// All dates present in the daily breakdown, sorted.
    #[must_use]
    pub fn dates(&self) -> BTreeSet<NaiveDate> {
        self.daily
            .values()
            .flat_map(BTreeMap::keys)
            .copied()
            .collect()
    }

    /// Transposed view: ore -> pilot -> volume.
    #[must_use]
    pub fn pivot(&self) -> BTreeMap<String, BTreeMap<PilotId, f64>> {
        let mut table: BTreeMap<String, BTreeMap<PilotId, f64>> = BTreeMap::new();
        for (pilot, ores) in &self.per_ore {
            for (ore, volume) in ores {
                *table
                    .entry(ore.clone())
                    .or_default()
                    .entry(pilot.clone())
                    .or_insert(0.0) += volume;
            }
        }
        table
    }
}

/// Oldest file age in whole days, minimum 1. Zero when no files exist.
#[must_use]
pub fn max_window_days(sources: &[LogSource], now: SystemTime) -> u32 {
    let Some(oldest) = sources.iter().map(|s| s.modified).min() else {
        return 0;
    };
    let age_days = now
        .duration_since(oldest)
        .map_or(0, |age| age.as_secs() / 86_400);
    u32::try_from(age_days).unwrap_or(u32::MAX).max(1)
}

#[derive(Debug, Default)]
struct FileAggregate {
    per_ore: BTreeMap<String, f64>,
    daily: BTreeMap<NaiveDate, BTreeMap<String, f64>>,
}

fn scan_file(path: &Path, catalog: &Catalog) -> std::io::Result<FileAggregate> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    let text = text.trim_start_matches('\u{feff}');

    // Resolution caching stays local to the file scan so parallel scans
    // share nothing.
    let mut ores = OreTable::new();
    let mut aggregate = FileAggregate::default();
    for line in text.lines() {
        // Compression is not reconstructed historically.
        let Some(LineEvent::Mined { units, ore, .. }) = catalog.classify_mined(line) else {
            continue;
        };
        let resolved = ores.resolve(&ore);
        #[expect(clippy::cast_precision_loss, reason = "unit counts are far below 2^52")]
        let volume = units as f64 * resolved.unit_volume;
        *aggregate.per_ore.entry(resolved.name.clone()).or_insert(0.0) += volume;

        if let Some(captures) = LOG_TIMESTAMP.captures(line) {
            if let Ok(date) = NaiveDate::parse_from_str(&captures[1], "%Y.%m.%d") {
                *aggregate
                    .daily
                    .entry(date)
                    .or_default()
                    .entry(resolved.name)
                    .or_insert(0.0) += volume;
            }
        }
    }
    Ok(aggregate)
}

/// Aggregates mining volume over the last `window_days` days.
///
/// The window is clamped to [1, oldest file age]; files modified exactly
/// at the window boundary are excluded (strictly newer only). Files are
/// scanned in parallel and unreadable files are skipped.
#[must_use]
pub fn aggregate_history(log_dir: &Path, window_days: u32, catalog: &Catalog) -> HistoryReport {
    aggregate_history_at(log_dir, window_days, catalog, SystemTime::now(), Utc::now())
}

fn aggregate_history_at(
    log_dir: &Path,
    window_days: u32,
    catalog: &Catalog,
    now: SystemTime,
    now_utc: DateTime<Utc>,
) -> HistoryReport {
    let sources = scan_log_dir(log_dir);
    let max_days = max_window_days(&sources, now);
    let window_days = window_days.clamp(1, max_days.max(1));
    let threshold = now_utc - TimeDelta::days(i64::from(window_days));

    let selected: Vec<&LogSource> = sources
        .iter()
        .filter(|source| DateTime::<Utc>::from(source.modified) > threshold)
        .collect();

    let scanned: Vec<(PilotId, FileAggregate)> = selected
        .par_iter()
        .filter_map(|source| match scan_file(&source.path, catalog) {
            Ok(aggregate) => Some((source.pilot.clone(), aggregate)),
            Err(error) => {
                tracing::warn!(path = ?source.path, %error, "skipping unreadable file");
                None
            }
        })
        .collect();

    let mut report = HistoryReport {
        window_days,
        ..HistoryReport::default()
    };
    for (pilot, aggregate) in scanned {
        let per_ore = report.per_ore.entry(pilot.clone()).or_default();
        for (ore, volume) in aggregate.per_ore {
            *per_ore.entry(ore).or_insert(0.0) += volume;
        }
        let daily = report.daily.entry(pilot).or_default();
        for (date, ores) in aggregate.daily {
            let day = daily.entry(date).or_default();
            for (ore, volume) in ores {
                *day.entry(ore).or_insert(0.0) += volume;
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use std::fs::{File, OpenOptions};
    use std::io::Write;
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;

    fn write_log(dir: &Path, name: &str, contents: &str) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    fn set_mtime(dir: &Path, name: &str, when: SystemTime) {
        OpenOptions::new()
            .write(true)
            .open(dir.join(name))
            .unwrap()
            .set_modified(when)
            .unwrap();
    }

    fn dated_mined_line(date: &str, amount: &str, ore: &str) -> String {
        format!(
            "[ {date} 18:03:21 ] (mining) You mined <font size=12><color=#ff00ff66>{amount}<color=#ff00a99d><font size=10> units of <color=#ffd98d00><font size=12>{ore}\n"
        )
    }

    fn crit_line(date: &str, amount: &str, ore: &str) -> String {
        format!(
            "[ {date} 18:04:00 ] (mining) Critical mining success! You mined an additional <color=#ff00ff66><font size=12>{amount}<color=#ff00a99d><font size=10> units of <color=#ffd98d00><font size=12>{ore}\n"
        )
    }

    fn pilot(id: &str) -> PilotId {
        PilotId::new(id).unwrap()
    }

    #[test]
    fn aggregates_regular_and_crit_but_not_compression() {
        let dir = TempDir::new().unwrap();
        let mut contents = dated_mined_line("2026.08.12", "1,000", "Veldspar");
        contents.push_str(&crit_line("2026.08.12", "500", "Veldspar"));
        contents.push_str(
            "[ 2026.08.12 19:00:00 ] (notify) Successfully compressed Veldspar into 10,000 Compressed Veldspar.\n",
        );
        write_log(dir.path(), "Chat_Log_90000001_a.txt", &contents);

        let report = aggregate_history(dir.path(), 7, &Catalog::default());
        assert!((report.pilot_total(&pilot("90000001")) - 150.0).abs() < 1e-9);
        assert!((report.per_ore[&pilot("90000001")]["Veldspar"] - 150.0).abs() < 1e-9);
    }

    #[test]
    fn crit_lines_count_regardless_of_configured_keyword() {
        let dir = TempDir::new().unwrap();
        write_log(
            dir.path(),
            "Chat_Log_90000001_a.txt",
            &crit_line("2026.08.12", "500", "Veldspar"),
        );

        // A keyword the line does not contain must not hide it from the scan.
        let catalog = Catalog::new("Kritischer Bergbauerfolg");
        let report = aggregate_history(dir.path(), 7, &catalog);
        assert!((report.pilot_total(&pilot("90000001")) - 50.0).abs() < 1e-9);
        let d12 = NaiveDate::from_ymd_opt(2026, 8, 12).unwrap();
        assert!((report.daily[&pilot("90000001")][&d12]["Veldspar"] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn daily_breakdown_splits_by_date_and_skips_undated() {
        let dir = TempDir::new().unwrap();
        let mut contents = dated_mined_line("2026.08.11", "100", "Veldspar");
        contents.push_str(&dated_mined_line("2026.08.12", "200", "Veldspar"));
        contents.push_str(
            "(mining) You mined <font size=12><color=#ff00ff66>300<color=#ff00a99d><font size=10> units of <color=#ffd98d00><font size=12>Veldspar\n",
        );
        write_log(dir.path(), "Chat_Log_90000001_a.txt", &contents);

        let report = aggregate_history(dir.path(), 7, &Catalog::default());
        // The undated line counts toward the simple aggregate only.
        assert!((report.pilot_total(&pilot("90000001")) - 60.0).abs() < 1e-9);

        let daily = &report.daily[&pilot("90000001")];
        let d11 = NaiveDate::from_ymd_opt(2026, 8, 11).unwrap();
        let d12 = NaiveDate::from_ymd_opt(2026, 8, 12).unwrap();
        assert!((daily[&d11]["Veldspar"] - 10.0).abs() < 1e-9);
        assert!((daily[&d12]["Veldspar"] - 20.0).abs() < 1e-9);
        assert_eq!(report.dates().len(), 2);
    }

    #[test]
    fn window_boundary_is_strict() {
        let dir = TempDir::new().unwrap();
        let line = dated_mined_line("2026.08.01", "100", "Veldspar");
        write_log(dir.path(), "Chat_Log_90000001_a.txt", &line);
        write_log(dir.path(), "Chat_Log_90000002_a.txt", &line);
        // Keep one recent file so the max window stays large.
        write_log(dir.path(), "Chat_Log_90000003_a.txt", "");
        set_mtime(dir.path(), "Chat_Log_90000003_a.txt", SystemTime::now() - Duration::from_secs(30 * 86_400));

        let now = SystemTime::now();
        let now_utc = Utc::now();
        let window = Duration::from_secs(7 * 86_400);
        // Exactly on the boundary: excluded.
        set_mtime(dir.path(), "Chat_Log_90000001_a.txt", now - window);
        // One minute inside: included.
        set_mtime(
            dir.path(),
            "Chat_Log_90000002_a.txt",
            now - window + Duration::from_secs(60),
        );

        let report = aggregate_history_at(dir.path(), 7, &Catalog::default(), now, now_utc);
        assert!(!report.per_ore.contains_key(&pilot("90000001")));
        assert!(report.per_ore.contains_key(&pilot("90000002")));
    }

    #[test]
    fn window_is_clamped_to_available_days() {
        let dir = TempDir::new().unwrap();
        write_log(
            dir.path(),
            "Chat_Log_90000001_a.txt",
            &dated_mined_line("2026.08.12", "100", "Veldspar"),
        );
        set_mtime(
            dir.path(),
            "Chat_Log_90000001_a.txt",
            SystemTime::now() - Duration::from_secs(3 * 86_400 + 60),
        );

        let report = aggregate_history(dir.path(), 365, &Catalog::default());
        assert_eq!(report.window_days, 3);
        let report = aggregate_history(dir.path(), 0, &Catalog::default());
        assert_eq!(report.window_days, 1);
    }

    #[test]
    fn pivot_transposes_pilot_and_ore() {
        let dir = TempDir::new().unwrap();
        write_log(
            dir.path(),
            "Chat_Log_90000001_a.txt",
            &dated_mined_line("2026.08.12", "100", "Veldspar"),
        );
        write_log(
            dir.path(),
            "Chat_Log_90000002_a.txt",
            &dated_mined_line("2026.08.12", "100", "Kernite"),
        );

        let report = aggregate_history(dir.path(), 7, &Catalog::default());
        let table = report.pivot();
        assert!((table["Veldspar"][&pilot("90000001")] - 10.0).abs() < 1e-9);
        assert!((table["Kernite"][&pilot("90000002")] - 120.0).abs() < 1e-9);
        assert!((report.combined_total() - 130.0).abs() < 1e-9);
    }

    #[test]
    fn empty_directory_yields_empty_report() {
        let dir = TempDir::new().unwrap();
        let report = aggregate_history(dir.path(), 7, &Catalog::default());
        assert!(report.per_ore.is_empty());
        assert!((report.combined_total()).abs() < f64::EPSILON);
    }
}
