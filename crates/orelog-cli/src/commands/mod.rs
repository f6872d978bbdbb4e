//! CLI command implementations.

pub mod history;
pub mod pilots;
pub mod profile;
pub mod util;
pub mod watch;
