//! Per-pilot mutable state and the session state machine.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Catalog, LineEvent, MineKind};
use crate::fitting::ShipProfiles;
use crate::hooks::{CompressionEvent, FleetObserver, MinedEvent, TrackedEvent};
use crate::ore::OreTable;

/// Validation errors for tracker identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("pilot ID cannot be empty")]
    Empty,

    #[error("pilot ID must be numeric, got {0:?}")]
    NotNumeric(String),
}

/// The numeric identity key embedded in log filenames.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PilotId(String);

impl PilotId {
    /// Creates a pilot ID after validation: non-empty, purely numeric.
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdError::Empty);
        }
        if !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdError::NotNumeric(id));
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PilotId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PilotId> for String {
    fn from(id: PilotId) -> Self {
        id.0
    }
}

impl fmt::Display for PilotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PilotId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Live state for one tracked pilot.
///
/// Aggregates accumulate only while the session is Active; the byte
/// offset is advanced by the ingestion loop only while Active, so bytes
/// appended during an Inactive stretch form a backlog that is replayed
/// in full on the next activation.
#[derive(Debug)]
pub struct PilotTracker {
    id: PilotId,
    /// Display name read from the log's Listener header.
    pub name: String,
    /// Most recently resolved log file for this pilot.
    pub log_path: Option<PathBuf>,
    offset: u64,
    crit_count: u32,
    total_m3: f64,
    ore_totals: BTreeMap<String, f64>,
    compression_totals: BTreeMap<String, f64>,
    session_active: bool,
    session_start: DateTime<Utc>,
    session_start_m3: f64,
    /// Named ship profiles; edits go through [`ShipProfiles`] so the
    /// always-one-profile invariants hold.
    pub profiles: ShipProfiles,
}

impl PilotTracker {
    #[must_use]
    pub fn new(id: PilotId, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            log_path: None,
            offset: 0,
            crit_count: 0,
            total_m3: 0.0,
            ore_totals: BTreeMap::new(),
            compression_totals: BTreeMap::new(),
            session_active: false,
            session_start: now,
            session_start_m3: 0.0,
            profiles: ShipProfiles::default(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &PilotId {
        &self.id
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.session_active
    }

    #[must_use]
    pub const fn crit_count(&self) -> u32 {
        self.crit_count
    }

    /// Lifetime volume total in m3 (since the last reset).
    #[must_use]
    pub const fn total_m3(&self) -> f64 {
        self.total_m3
    }

    /// Volume accumulated in the current session.
    #[must_use]
    pub fn session_m3(&self) -> f64 {
        self.total_m3 - self.session_start_m3
    }

    #[must_use]
    pub const fn session_start(&self) -> DateTime<Utc> {
        self.session_start
    }

    #[must_use]
    pub const fn session_start_m3(&self) -> f64 {
        self.session_start_m3
    }

    /// Per-ore mined volume.
    #[must_use]
    pub const fn ore_totals(&self) -> &BTreeMap<String, f64> {
        &self.ore_totals
    }

    /// Per-ore compressed-equivalent volume, kept separate from mined
    /// totals.
    #[must_use]
    pub const fn compression_totals(&self) -> &BTreeMap<String, f64> {
        &self.compression_totals
    }

    /// Stored byte offset into the current log file.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Sets the byte offset. The ingestion loop only advances this while
    /// Active; rotation and initial discovery may set it in any state.
    pub const fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }

    /// Folds a batch of log lines into the aggregates.
    ///
    /// No-op while Inactive. At most one critical event is recorded per
    /// batch (first match wins); further critical lines in the same
    /// batch are dropped entirely, mirroring the live dashboard this
    /// engine was extracted from.
    pub fn ingest_batch<'a, I>(
        &mut self,
        lines: I,
        catalog: &Catalog,
        ores: &mut OreTable,
        observer: &mut dyn FleetObserver,
    ) where
        I: IntoIterator<Item = &'a str>,
    {
        if !self.session_active {
            return;
        }

        let mut crit_seen = false;
        for line in lines {
            match catalog.classify(line) {
                Some(LineEvent::Mined { units, ore, kind }) => match kind {
                    MineKind::Regular => {
                        let event = self.fold_mined(units, &ore, kind, ores);
                        observer.event_ingested(&TrackedEvent::Mined(event));
                    }
                    MineKind::Critical => {
                        if crit_seen {
                            continue;
                        }
                        crit_seen = true;
                        let event = self.fold_mined(units, &ore, kind, ores);
                        self.crit_count = self.crit_count.saturating_add(1);
                        observer.critical_hit(&event);
                        observer.event_ingested(&TrackedEvent::Mined(event));
                    }
                },
                Some(LineEvent::Compressed { units, ore }) => {
                    let event = self.fold_compressed(units, &ore, ores);
                    observer.event_ingested(&TrackedEvent::Compressed(event));
                }
                None => {}
            }
        }
    }

    fn fold_mined(
        &mut self,
        units: u64,
        ore: &str,
        kind: MineKind,
        ores: &mut OreTable,
    ) -> MinedEvent {
        let resolved = ores.resolve(ore);
        #[expect(clippy::cast_precision_loss, reason = "unit counts are far below 2^52")]
        let volume = units as f64 * resolved.unit_volume;
        self.total_m3 += volume;
        *self.ore_totals.entry(resolved.name.clone()).or_insert(0.0) += volume;
        tracing::trace!(pilot = %self.id, ore = %resolved.name, volume, ?kind, "mined");
        MinedEvent {
            pilot: self.id.clone(),
            ore: resolved.name,
            units,
            volume,
            kind,
        }
    }

    fn fold_compressed(
        &mut self,
        compressed_units: u64,
        ore: &str,
        ores: &mut OreTable,
    ) -> CompressionEvent {
        let ratio = u64::from(OreTable::compression_ratio(ore));
        let original_units = compressed_units.saturating_mul(ratio);
        let resolved = ores.resolve(ore);
        #[expect(clippy::cast_precision_loss, reason = "unit counts are far below 2^52")]
        let volume = original_units as f64 * resolved.unit_volume;
        *self
            .compression_totals
            .entry(resolved.name.clone())
            .or_insert(0.0) += volume;
        tracing::trace!(pilot = %self.id, ore = %resolved.name, volume, "compressed");
        CompressionEvent {
            pilot: self.id.clone(),
            ore: resolved.name,
            compressed_units,
            volume,
        }
    }

    /// Inactive -> Active transition.
    ///
    /// `backlog` is the file content between the stored offset and the
    /// current end of file, and `end_offset` is that end position. The
    /// backlog runs through the full pipeline first, then the offset
    /// jumps to `end_offset`, and only then is the session baseline
    /// captured so rate math starts clean.
    pub fn activate(
        &mut self,
        backlog: &str,
        end_offset: u64,
        now: DateTime<Utc>,
        catalog: &Catalog,
        ores: &mut OreTable,
        observer: &mut dyn FleetObserver,
    ) {
        if self.session_active {
            return;
        }
        self.session_active = true;
        self.ingest_batch(backlog.lines(), catalog, ores, observer);
        self.offset = end_offset;
        self.session_start = now;
        self.session_start_m3 = self.total_m3;
        observer.session_changed(&self.id, true);
    }

    /// Active -> Inactive transition. The offset is frozen; bytes
    /// appended from here on become backlog for the next activation.
    pub fn deactivate(&mut self, observer: &mut dyn FleetObserver) {
        if !self.session_active {
            return;
        }
        self.session_active = false;
        observer.session_changed(&self.id, false);
    }

    /// Zeroes all accumulated state and re-bases the session baseline.
    /// Forces Inactive first if currently Active.
    pub fn reset(&mut self, now: DateTime<Utc>, observer: &mut dyn FleetObserver) {
        if self.session_active {
            self.deactivate(observer);
        }
        self.crit_count = 0;
        self.total_m3 = 0.0;
        self.ore_totals.clear();
        self.compression_totals.clear();
        self.session_start = now;
        self.session_start_m3 = 0.0;
    }

    /// Exportable snapshot of the aggregates, for consumers that render
    /// or serialize state.
    #[must_use]
    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            active: self.session_active,
            crit_count: self.crit_count,
            total_m3: self.total_m3,
            session_m3: self.session_m3(),
            ore_totals: self.ore_totals.clone(),
            compression_totals: self.compression_totals.clone(),
        }
    }
}

/// Plain-data view of a tracker's aggregates.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerSnapshot {
    pub id: PilotId,
    pub name: String,
    pub active: bool,
    pub crit_count: u32,
    pub total_m3: f64,
    pub session_m3: f64,
    pub ore_totals: BTreeMap<String, f64>,
    pub compression_totals: BTreeMap<String, f64>,
}
