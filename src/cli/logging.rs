//! Tracing subscriber setup
//!
//! The subscriber is installed straight after argument parsing so that events
//! raised while loading configuration are not lost. Until the configuration
//! is known it runs at the default level; [`LogControl::apply_configured_level`]
//! then swaps in the configured level through a reload handle, unless
//! `RUST_LOG` or a verbosity flag already fixed it.

use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use crate::cli::Cli;
use crate::config::LoggingConfig;

const CRATE_TARGET: &str = "divvy_fetcher";

/// Filter scoping `level` to this crate
fn crate_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("{}={}", CRATE_TARGET, level))
}

/// Handle for adjusting the installed filter after startup
#[derive(Debug)]
pub struct LogControl {
    handle: reload::Handle<EnvFilter, Registry>,
    pinned: bool,
}

impl LogControl {
    /// Build the reloadable filter layer and its control
    ///
    /// `env_filter` is the filter parsed from `RUST_LOG`, if set.
    pub fn new(
        cli: &Cli,
        env_filter: Option<EnvFilter>,
    ) -> (reload::Layer<EnvFilter, Registry>, Self) {
        let pinned = env_filter.is_some() || cli.log_level().is_some();
        let filter = env_filter.unwrap_or_else(|| {
            crate_filter(&cli.effective_log_level(&LoggingConfig::default().level))
        });
        let (layer, handle) = reload::Layer::new(filter);
        (layer, Self { handle, pinned })
    }

    /// Switch to the level from the configuration file
    ///
    /// Returns `false` when the level is fixed by `RUST_LOG` or a flag, or
    /// the subscriber is gone.
    pub fn apply_configured_level(&self, level: &str) -> bool {
        if self.pinned {
            return false;
        }
        match self.handle.reload(crate_filter(level)) {
            Ok(()) => true,
            Err(e) => {
                warn!("Cannot apply configured log level {}: {}", level, e);
                false
            }
        }
    }

    /// Directives of the filter currently installed
    pub fn current_filter(&self) -> Option<String> {
        self.handle.with_current(|filter| filter.to_string()).ok()
    }
}

/// Install the global subscriber from CLI flags and `RUST_LOG`
pub fn init_logging(cli: &Cli) -> LogControl {
    let (filter, control) = LogControl::new(cli, EnvFilter::try_from_default_env().ok());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(cli.global.verbose || cli.global.very_verbose),
        )
        .init();

    control
}
