//! Command-line interface components
//!
//! This module contains CLI-specific code for the Divvy Fetcher application,
//! including argument parsing, logging setup, progress display, and the
//! command handler.

pub mod args;
pub mod commands;
pub mod logging;
pub mod progress;

pub use args::{Cli, FetchArgs, GlobalArgs};
pub use commands::handle_fetch;
pub use logging::{init_logging, LogControl};
pub use progress::{discovery_spinner, ProgressConfig, TransferProgress};
