//! Mining log tracker CLI library.
//!
//! This crate provides the CLI interface for the mining log tracker.

mod cli;
pub mod commands;
mod config;
mod store;

pub use cli::{Cli, Commands, ProfileAction};
pub use config::Config;
pub use store::{ProfileStore, default_store_path};
