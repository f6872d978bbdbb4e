//! Log file discovery and identity-key extraction.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::{Duration, Instant, SystemTime};

use regex::Regex;

use orelog_core::PilotId;

/// How long a directory listing stays fresh.
pub const CACHE_TTL: Duration = Duration::from_secs(5);

/// Pilot display names appear in the log header within the first few
/// lines.
const LISTENER_SCAN_LINES: usize = 16;

static LISTENER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Listener:\s*(.+)").expect("valid listener pattern"));

/// One discovered log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSource {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub pilot: PilotId,
}

/// A pilot found during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPilot {
    pub id: PilotId,
    /// Display name from the Listener header, when any file carries one.
    pub name: Option<String>,
    pub file_count: usize,
}

/// Extracts the numeric identity key from a log filename.
///
/// Filenames look like `Mining_Ledger_90000001_20260812.txt`; the key is
/// the third `_`-separated segment of the stem, and only if it is purely
/// numeric. Anything else is not a pilot log.
#[must_use]
pub fn pilot_id_from_path(path: &Path) -> Option<PilotId> {
    let stem = path.file_stem()?.to_str()?;
    let segment = stem.split('_').nth(2)?;
    PilotId::new(segment).ok()
}

fn is_log_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"))
}

fn collect_dir(dir: &Path, out: &mut Vec<LogSource>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || !is_log_file(&path) {
            continue;
        }
        let Some(pilot) = pilot_id_from_path(&path) else {
            continue;
        };
        match entry.metadata().and_then(|m| m.modified()) {
            Ok(modified) => out.push(LogSource {
                path,
                modified,
                pilot,
            }),
            Err(error) => {
                tracing::warn!(path = ?path, %error, "skipping file without readable mtime");
            }
        }
    }
}

/// Enumerates candidate log files in a directory and its `OLD/` archive
/// subdirectory. Missing directories yield an empty list.
#[must_use]
pub fn scan_log_dir(dir: &Path) -> Vec<LogSource> {
    let mut sources = Vec::new();
    collect_dir(dir, &mut sources);
    collect_dir(&dir.join("OLD"), &mut sources);
    sources
}

/// Reads the `Listener: <name>` header from the top of a log file.
/// BOM-tolerant and lossy: the game writes UTF-8 with a BOM, but damaged
/// files must not break discovery.
#[must_use]
pub fn listener_name(path: &Path) -> Option<String> {
    let file = fs::File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    for i in 0..LISTENER_SCAN_LINES {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).ok()? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = if i == 0 {
            line.trim_start_matches('\u{feff}')
        } else {
            &line
        };
        if let Some(captures) = LISTENER_LINE.captures(line) {
            return Some(captures[1].trim().to_string());
        }
    }
    None
}

/// Directory scanner with a TTL-bounded listing cache.
///
/// The cache is an owned value inside the locator; callers that need a
/// guaranteed-fresh listing (history scans) use [`scan_log_dir`]
/// directly.
#[derive(Debug)]
pub struct Locator {
    dir: PathBuf,
    ttl: Duration,
    cache: Option<(Instant, Vec<LogSource>)>,
}

impl Locator {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_ttl(dir, CACHE_TTL)
    }

    #[must_use]
    pub fn with_ttl(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
            cache: None,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Current candidate listing, rescanned only after the TTL expires.
    pub fn candidates(&mut self) -> &[LogSource] {
        let stale = self
            .cache
            .as_ref()
            .is_none_or(|(at, _)| at.elapsed() > self.ttl);
        if stale {
            self.cache = Some((Instant::now(), scan_log_dir(&self.dir)));
        }
        // Freshly populated above when stale.
        self.cache.as_ref().map_or(&[], |(_, entries)| entries)
    }

    /// The most recently modified candidate for a pilot, or none.
    pub fn latest_file_for(&mut self, pilot: &PilotId) -> Option<PathBuf> {
        self.candidates()
            .iter()
            .filter(|source| &source.pilot == pilot)
            .max_by_key(|source| source.modified)
            .map(|source| source.path.clone())
    }

    /// Finds every pilot with at least one log file, with display names
    /// where a Listener header exists. Ordered by descending file count
    /// so the most-played pilots come first.
    pub fn discover(&mut self) -> Vec<DiscoveredPilot> {
        let mut pilots: Vec<DiscoveredPilot> = Vec::new();
        let sources: Vec<LogSource> = self.candidates().to_vec();
        for source in &sources {
            if let Some(found) = pilots.iter_mut().find(|p| p.id == source.pilot) {
                found.file_count += 1;
                if found.name.is_none() {
                    found.name = listener_name(&source.path);
                }
            } else {
                pilots.push(DiscoveredPilot {
                    id: source.pilot.clone(),
                    name: listener_name(&source.path),
                    file_count: 1,
                });
            }
        }
        pilots.sort_by(|a, b| b.file_count.cmp(&a.file_count).then_with(|| a.id.cmp(&b.id)));
        pilots
    }
}
