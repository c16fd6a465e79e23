//! Terminal progress display for downloads and discovery
//!
//! [`TransferProgress`] renders the executor's [`TransferEvent`]s as one
//! indicatif byte bar per file. When stderr is not a terminal, or bars are
//! disabled, bars are hidden and only the log lines remain.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::app::{ProgressObserver, TransferEvent};

/// Configuration for progress display
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Enable visual progress bars
    pub enable_progress_bars: bool,
    /// Spinner refresh interval
    pub tick_interval: Duration,
    /// Maximum width for file names in the bar prefix
    pub max_filename_width: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enable_progress_bars: true,
            tick_interval: Duration::from_millis(120),
            max_filename_width: 32,
        }
    }
}

impl ProgressConfig {
    /// Disable bars when quiet or not attached to a terminal
    pub fn for_terminal(quiet: bool) -> Self {
        Self {
            enable_progress_bars: !quiet && atty::is(atty::Stream::Stderr),
            ..Default::default()
        }
    }
}

/// Per-file byte progress bars
#[derive(Debug)]
pub struct TransferProgress {
    config: ProgressConfig,
    current: Mutex<Option<ProgressBar>>,
}

impl TransferProgress {
    pub fn new(config: ProgressConfig) -> Self {
        Self {
            config,
            current: Mutex::new(None),
        }
    }

    fn new_bar(&self, filename: &str, total: u64) -> ProgressBar {
        if !self.config.enable_progress_bars {
            return ProgressBar::hidden();
        }

        let bar = if total > 0 {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{prefix} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("##-"),
            );
            bar
        } else {
            // Length unknown: show bytes received only
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {prefix} {bytes} ({bytes_per_sec})")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.enable_steady_tick(self.config.tick_interval);
            bar
        };
        bar.set_prefix(truncate_filename(filename, self.config.max_filename_width));
        bar
    }

    fn with_current(&self, f: impl FnOnce(&mut Option<ProgressBar>)) {
        match self.current.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

impl Default for TransferProgress {
    fn default() -> Self {
        Self::new(ProgressConfig::default())
    }
}

impl ProgressObserver for TransferProgress {
    fn on_event(&self, event: TransferEvent<'_>) {
        match event {
            TransferEvent::Skipped { filename } => {
                debug!("Progress: {} already complete", filename);
            }
            TransferEvent::Started { filename, total } => {
                let bar = self.new_bar(filename, total);
                self.with_current(|current| {
                    if let Some(previous) = current.replace(bar) {
                        previous.finish_and_clear();
                    }
                });
            }
            TransferEvent::Advanced { transferred, .. } => {
                self.with_current(|current| {
                    if let Some(bar) = current.as_ref() {
                        bar.set_position(transferred);
                    }
                });
            }
            TransferEvent::Finished { .. } => {
                self.with_current(|current| {
                    if let Some(bar) = current.take() {
                        bar.finish();
                    }
                });
            }
            TransferEvent::Failed { .. } => {
                self.with_current(|current| {
                    if let Some(bar) = current.take() {
                        bar.abandon();
                    }
                });
            }
        }
    }
}

/// Spinner shown while probing the archive
pub fn discovery_spinner(config: &ProgressConfig, message: impl Into<String>) -> ProgressBar {
    if !config.enable_progress_bars {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["◐", "◓", "◑", "◒"]),
    );
    spinner.set_message(message.into());
    spinner.enable_steady_tick(config.tick_interval);
    spinner
}

/// Shorten a filename to `max_width` characters, keeping its start
fn truncate_filename(filename: &str, max_width: usize) -> String {
    if filename.chars().count() <= max_width {
        return filename.to_string();
    }
    let keep = max_width.saturating_sub(3);
    let head: String = filename.chars().take(keep).collect();
    format!("{head}...")
}
