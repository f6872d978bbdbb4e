//! The per-tick ingestion driver.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

use orelog_core::{Catalog, FleetObserver, OreTable, PilotId, PilotTracker, TrackerSnapshot};

use crate::locator::Locator;

#[derive(Debug, Error)]
pub enum PollError {
    #[error("no tracked pilot with ID {0}")]
    UnknownPilot(PilotId),
}

/// Reads everything from `offset` to end-of-file.
///
/// Decoding is lossy and a leading BOM is stripped when reading from the
/// top; damaged bytes degrade to replacement characters instead of
/// failing the tick. Returns the decoded text and the new byte position.
fn read_from(path: &Path, offset: u64) -> io::Result<(String, u64)> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    let new_offset = offset + bytes.len() as u64;
    let mut text = String::from_utf8_lossy(&bytes).into_owned();
    if offset == 0 && text.starts_with('\u{feff}') {
        text.remove(0);
    }
    Ok((text, new_offset))
}

/// Drives ingestion for a whole fleet of tracked pilots.
///
/// One poller owns all mutable tracker state, so ingestion, session
/// toggling, and resets are serialized by construction. A tick performs
/// at most one bounded read per pilot and never fails: per-pilot I/O
/// errors are logged and retried on the next tick.
#[derive(Debug)]
pub struct Poller {
    locator: Locator,
    catalog: Catalog,
    ores: OreTable,
    trackers: BTreeMap<PilotId, PilotTracker>,
}

impl Poller {
    #[must_use]
    pub fn new(log_dir: impl Into<PathBuf>, catalog: Catalog) -> Self {
        Self {
            locator: Locator::new(log_dir),
            catalog,
            ores: OreTable::new(),
            trackers: BTreeMap::new(),
        }
    }

    /// Scans the log directory and creates trackers for pilots not seen
    /// before. Existing trackers keep their accumulated state. Returns
    /// the IDs of newly added pilots.
    pub fn discover_pilots(&mut self, now: DateTime<Utc>) -> Vec<PilotId> {
        let mut added = Vec::new();
        for pilot in self.locator.discover() {
            if self.trackers.contains_key(&pilot.id) {
                continue;
            }
            let name = pilot
                .name
                .unwrap_or_else(|| format!("Pilot {}", pilot.id));
            tracing::info!(pilot = %pilot.id, name = %name, files = pilot.file_count, "discovered pilot");
            self.trackers
                .insert(pilot.id.clone(), PilotTracker::new(pilot.id.clone(), name, now));
            added.push(pilot.id);
        }
        added
    }

    /// One ingestion pass over every tracked pilot.
    ///
    /// Refreshes the latest-file pointer (a pointer change means
    /// rotation, which resets the offset to the top of the new file),
    /// reads newly appended bytes, and folds them into the tracker. The
    /// offset advances only while the pilot's session is Active, so
    /// Inactive stretches accumulate backlog instead of losing data.
    pub fn tick(&mut self, observer: &mut dyn FleetObserver) {
        let Self {
            locator,
            catalog,
            ores,
            trackers,
        } = self;

        for (id, tracker) in trackers.iter_mut() {
            if let Some(latest) = locator.latest_file_for(id) {
                if tracker.log_path.as_ref() != Some(&latest) {
                    tracing::debug!(pilot = %id, path = ?latest, "log rotated");
                    tracker.log_path = Some(latest);
                    tracker.set_offset(0);
                }
            }

            let Some(path) = tracker.log_path.clone() else {
                continue;
            };
            match read_from(&path, tracker.offset()) {
                Ok((data, new_offset)) => {
                    if !data.is_empty() {
                        tracker.ingest_batch(data.lines(), catalog, ores, observer);
                    }
                    if tracker.is_active() {
                        tracker.set_offset(new_offset);
                    }
                }
                Err(error) => {
                    tracing::warn!(pilot = %id, path = ?path, %error, "read failed, retrying next tick");
                }
            }
        }
    }

    /// Starts a session for one pilot, replaying any backlog first.
    ///
    /// If the backlog read fails the session still starts from the
    /// current offset; the missed bytes are picked up by the next tick.
    pub fn start_session(
        &mut self,
        id: &PilotId,
        now: DateTime<Utc>,
        observer: &mut dyn FleetObserver,
    ) -> Result<(), PollError> {
        let Self {
            locator,
            catalog,
            ores,
            trackers,
        } = self;
        let tracker = trackers
            .get_mut(id)
            .ok_or_else(|| PollError::UnknownPilot(id.clone()))?;
        if tracker.is_active() {
            return Ok(());
        }

        if tracker.log_path.is_none() {
            tracker.log_path = locator.latest_file_for(id);
        }
        let (backlog, end_offset) = match &tracker.log_path {
            Some(path) => read_from(path, tracker.offset()).unwrap_or_else(|error| {
                tracing::warn!(pilot = %id, %error, "backlog read failed, starting without it");
                (String::new(), tracker.offset())
            }),
            None => (String::new(), tracker.offset()),
        };
        tracker.activate(&backlog, end_offset, now, catalog, ores, observer);
        Ok(())
    }

    /// Stops a session. The offset freezes where it is.
    pub fn stop_session(
        &mut self,
        id: &PilotId,
        observer: &mut dyn FleetObserver,
    ) -> Result<(), PollError> {
        let tracker = self
            .trackers
            .get_mut(id)
            .ok_or_else(|| PollError::UnknownPilot(id.clone()))?;
        tracker.deactivate(observer);
        Ok(())
    }

    /// Zeroes a pilot's accumulated state.
    pub fn reset(
        &mut self,
        id: &PilotId,
        now: DateTime<Utc>,
        observer: &mut dyn FleetObserver,
    ) -> Result<(), PollError> {
        let tracker = self
            .trackers
            .get_mut(id)
            .ok_or_else(|| PollError::UnknownPilot(id.clone()))?;
        tracker.reset(now, observer);
        Ok(())
    }

    #[must_use]
    pub fn tracker(&self, id: &PilotId) -> Option<&PilotTracker> {
        self.trackers.get(id)
    }

    #[must_use]
    pub fn tracker_mut(&mut self, id: &PilotId) -> Option<&mut PilotTracker> {
        self.trackers.get_mut(id)
    }

    pub fn trackers(&self) -> impl Iterator<Item = &PilotTracker> {
        self.trackers.values()
    }

    #[must_use]
    pub fn snapshots(&self) -> Vec<TrackerSnapshot> {
        self.trackers.values().map(PilotTracker::snapshot).collect()
    }
}
