//! Log line classification.
//!
//! Game logs are overwhelmingly unrelated chatter; a cheap substring
//! pre-filter rejects those before the extraction patterns run.

use std::sync::LazyLock;

use regex::Regex;

/// Marker token present in every mining notification line.
const MINING_MARKER: &str = "(mining)";

/// Default keyword identifying a critical (bonus yield) mining line.
pub const DEFAULT_CRIT_KEYWORD: &str = "Critical mining success";

/// Anchored gate confirming the line is a mining notification.
static MINING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\[.*?\]\s+\(mining\)").expect("valid mining gate pattern")
});

static REGULAR_MINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)You mined <font size=12><color=[^>]+>(?P<amount>[\d,]+)<color=[^>]+><font size=10> units of <color=[^>]+><font size=12>(?P<ore>[^\r\n<]+)",
    )
    .expect("valid regular mine pattern")
});

static CRIT_MINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)You mined an additional <color=[^>]+><font size=12>(?P<amount>[\d,]+)<color=[^>]+><font size=10> units of <color=[^>]+><font size=12>(?P<ore>[^\r\n<]+)",
    )
    .expect("valid critical mine pattern")
});

static COMPRESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Successfully compressed (?P<ore>\S+) into (?P<amount>[\d,]+) Compressed")
        .expect("valid compression pattern")
});

/// Whether a mined event was a normal or bonus-yield cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MineKind {
    Regular,
    Critical,
}

/// A typed event extracted from a single log line.
///
/// Ore names here are raw-but-cleaned tokens; volume resolution happens
/// in [`crate::ore::OreTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// A mining cycle yielded `units` of `ore`.
    Mined {
        units: u64,
        ore: String,
        kind: MineKind,
    },
    /// Raw ore was compressed; `units` is the compressed unit count.
    Compressed { units: u64, ore: String },
}

/// Classifies raw log lines into typed events.
///
/// The critical keyword is configurable, so the catalog is an instance
/// rather than a set of free functions. "At most one critical per batch"
/// is the caller's responsibility; the catalog classifies every line
/// independently.
#[derive(Debug, Clone)]
pub struct Catalog {
    crit_keyword: String,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(DEFAULT_CRIT_KEYWORD)
    }
}

impl Catalog {
    pub fn new(crit_keyword: impl Into<String>) -> Self {
        Self {
            crit_keyword: crit_keyword.into(),
        }
    }

    /// Classifies one line, returning `None` for anything that is not a
    /// recognized mining or compression notification.
    #[must_use]
    pub fn classify(&self, line: &str) -> Option<LineEvent> {
        // Compression notifications are not (mining)-tagged.
        if let Some(caps) = COMPRESSION.captures(line) {
            return Some(LineEvent::Compressed {
                units: parse_units(&caps["amount"])?,
                ore: clean_ore_token(&caps["ore"]),
            });
        }

        if !line.contains(MINING_MARKER) || !MINING_LINE.is_match(line) {
            return None;
        }

        if line.contains(&self.crit_keyword) {
            if let Some(caps) = CRIT_MINE.captures(line) {
                return Some(LineEvent::Mined {
                    units: parse_units(&caps["amount"])?,
                    ore: clean_ore_token(&caps["ore"]),
                    kind: MineKind::Critical,
                });
            }
        }

        if let Some(caps) = REGULAR_MINE.captures(line) {
            return Some(LineEvent::Mined {
                units: parse_units(&caps["amount"])?,
                ore: clean_ore_token(&caps["ore"]),
                kind: MineKind::Regular,
            });
        }

        None
    }

    /// Extracts a mined event without the anchored notification gate
    /// and without the critical-keyword filter.
    ///
    /// Historical scans use this: archived lines sometimes lack the
    /// leading timestamp bracket, and the extraction shapes alone are
    /// unambiguous. Compression lines are never returned here.
    #[must_use]
    pub fn classify_mined(&self, line: &str) -> Option<LineEvent> {
        if let Some(caps) = REGULAR_MINE.captures(line) {
            return Some(LineEvent::Mined {
                units: parse_units(&caps["amount"])?,
                ore: clean_ore_token(&caps["ore"]),
                kind: MineKind::Regular,
            });
        }
        if let Some(caps) = CRIT_MINE.captures(line) {
            return Some(LineEvent::Mined {
                units: parse_units(&caps["amount"])?,
                ore: clean_ore_token(&caps["ore"]),
                kind: MineKind::Critical,
            });
        }
        None
    }
}

/// Parses a comma-grouped unit count ("1,500" -> 1500).
fn parse_units(raw: &str) -> Option<u64> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    match digits.parse() {
        Ok(n) => Some(n),
        Err(e) => {
            tracing::trace!(raw, error = %e, "unparseable unit count");
            None
        }
    }
}

/// Truncates an ore token at the first markup delimiter or line break,
/// then trims whitespace and a trailing period.
#[must_use]
pub fn clean_ore_token(raw: &str) -> String {
    let end = raw
        .find(['<', '\r', '\n'])
        .unwrap_or(raw.len());
    raw[..end].trim().trim_end_matches('.').to_string()
}
