//! Live watch loop.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use chrono::Utc;

use orelog_core::{
    Catalog, FleetObserver, MinedEvent, PilotId, PilotTracker, actual_rate, theoretical_rate,
};
use orelog_ingest::Poller;

use crate::commands::util::format_volume;
use crate::config::Config;
use crate::store::ProfileStore;

/// Prints critical hits as they happen, optionally ringing the terminal
/// bell. Best-effort: write failures are ignored.
struct AlertObserver<W> {
    bell: bool,
    out: W,
}

impl<W: Write> FleetObserver for AlertObserver<W> {
    fn critical_hit(&mut self, event: &MinedEvent) {
        let bell = if self.bell { "\x07" } else { "" };
        let _ = writeln!(
            self.out,
            "{bell}*** CRITICAL HIT: {} mined {} units of {} ({} m3)",
            event.pilot,
            event.units,
            event.ore,
            format_volume(event.volume),
        );
        let _ = self.out.flush();
    }

    fn session_changed(&mut self, pilot: &PilotId, active: bool) {
        let state = if active { "started" } else { "stopped" };
        tracing::info!(%pilot, "session {state}");
    }

    fn profile_changed(&mut self, pilot: &PilotId, active_profile: &str) {
        tracing::info!(%pilot, profile = active_profile, "ship profile applied");
    }
}

/// One pilot's status line plus ore breakdown.
fn format_tracker(tracker: &PilotTracker, now: chrono::DateTime<Utc>) -> String {
    let mut output = String::new();
    let theoretical = theoretical_rate(tracker.profiles.active_modules());
    let actual = if tracker.is_active() {
        actual_rate(tracker, now)
    } else {
        0.0
    };
    writeln!(
        output,
        "{} | session {} m3 | {:.2} m3/s actual | {:.2} m3/s fitted | crits {}",
        tracker.name,
        format_volume(tracker.session_m3()),
        actual,
        theoretical,
        tracker.crit_count(),
    )
    .unwrap();
    for (ore, volume) in tracker.ore_totals() {
        writeln!(output, "  {ore}: {} m3", format_volume(*volume)).unwrap();
    }
    output
}

fn format_status(poller: &Poller, config: &Config, now: chrono::DateTime<Utc>) -> String {
    let mut output = String::new();
    for tracker in poller.trackers() {
        if !config.is_visible(tracker.id().as_str()) {
            continue;
        }
        output.push_str(&format_tracker(tracker, now));
    }
    output
}

/// Polls until interrupted, printing a status block every `refresh`
/// seconds.
pub async fn run(
    config: &Config,
    all: bool,
    refresh: u64,
    store_path: &Path,
    writer: &mut impl Write,
) -> Result<()> {
    let catalog = Catalog::new(&config.crit_keyword);
    let mut poller = Poller::new(&config.log_dir, catalog);
    let discovered = poller.discover_pilots(Utc::now());
    if discovered.is_empty() {
        writeln!(
            writer,
            "No pilot logs found in {}",
            config.log_dir.display()
        )?;
        return Ok(());
    }

    let store = ProfileStore::load(store_path);
    let mut observer = AlertObserver {
        bell: config.alert_bell,
        out: std::io::stdout(),
    };
    for id in &discovered {
        if let Some(profiles) = store.profiles(id) {
            if let Some(tracker) = poller.tracker_mut(id) {
                tracker.profiles = profiles.clone();
                observer.profile_changed(id, tracker.profiles.active_name());
            }
        }
        if all || config.is_visible(id.as_str()) {
            poller.start_session(id, Utc::now(), &mut observer)?;
        }
    }

    let mut interval = tokio::time::interval(config.poll_interval());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let interval_ms = u64::try_from(config.poll_interval().as_millis()).unwrap_or(1000);
    let refresh_every = (refresh * 1000 / interval_ms).max(1);
    let mut ticks: u64 = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                poller.tick(&mut observer);
                ticks += 1;
                if ticks % refresh_every == 0 {
                    write!(writer, "{}", format_status(&poller, config, Utc::now()))?;
                    writer.flush()?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    writeln!(writer, "final totals:")?;
    write!(writer, "{}", format_status(&poller, config, Utc::now()))?;
    Ok(())
}
