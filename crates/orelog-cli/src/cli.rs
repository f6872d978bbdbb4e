//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// EVE Online mining log tracker.
///
/// Tails the game's chat log files, aggregates mining yield per pilot,
/// and produces day-windowed history reports.
#[derive(Debug, Parser)]
#[command(name = "orelog", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Watch live logs and print session statistics.
    Watch {
        /// Track every discovered pilot, ignoring the visibility filter.
        #[arg(long)]
        all: bool,

        /// Seconds between printed status blocks.
        #[arg(long, default_value_t = 5)]
        refresh: u64,
    },

    /// Aggregate mining volume over the last N days.
    History {
        /// Window size in days (defaults to the configured window).
        #[arg(long)]
        days: Option<u32>,

        /// Break the report down per day.
        #[arg(long)]
        daily: bool,

        /// Transpose to an ore-by-pilot table.
        #[arg(long, conflicts_with = "daily")]
        pivot: bool,

        /// Emit JSON instead of the text report.
        #[arg(long)]
        json: bool,
    },

    /// List discovered pilots.
    Pilots {
        /// Emit JSON instead of the text listing.
        #[arg(long)]
        json: bool,
    },

    /// Inspect and edit ship fitting profiles.
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

/// Ship profile editing actions.
#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    /// List a pilot's profiles and modules.
    List {
        /// Pilot ID.
        pilot: String,
    },

    /// Create a new empty profile.
    Create {
        pilot: String,
        name: String,
    },

    /// Delete a profile.
    Delete {
        pilot: String,
        name: String,
    },

    /// Rename a profile.
    Rename {
        pilot: String,
        old: String,
        new: String,
    },

    /// Switch the active profile.
    Switch {
        pilot: String,
        name: String,
    },

    /// Set one module slot on the active profile.
    SetModule {
        pilot: String,

        /// Slot index, 0-based.
        slot: usize,

        /// Module name.
        #[arg(long)]
        name: String,

        /// Yield per cycle in m3.
        #[arg(long)]
        yield_m3: f64,

        /// Cycle time in seconds.
        #[arg(long)]
        cycle: f64,

        /// Leave the module fitted but excluded from rate math.
        #[arg(long)]
        disabled: bool,
    },
}
