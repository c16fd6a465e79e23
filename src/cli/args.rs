//! Command-line argument parsing for Divvy Fetcher
//!
//! This module defines the CLI structure using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::config::Overrides;

/// Divvy Fetcher - Mirror Divvy bike trip data archives
#[derive(Parser, Debug, Clone)]
#[command(
    name = "divvy_fetcher",
    version,
    about = "Discover and download Divvy bike trip data archives",
    long_about = "Discovers which monthly Divvy trip data archives exist on the public object store,
optionally narrows them to a year or a quarter, and downloads them into a local directory.
Files that are already present with the expected size are skipped."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Discovery, filter and download options
    #[command(flatten)]
    pub fetch: FetchArgs,
}

/// Logging and configuration options
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Very verbose logging (trace level)
    #[arg(long)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Arguments for discovery, filtering and downloading
#[derive(Args, Debug, Clone, Default)]
pub struct FetchArgs {
    /// Base URL of the trip data archive
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Directory to save downloaded files [default: data]
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Filter files by year (e.g., 2023)
    #[arg(long)]
    pub year: Option<i32>,

    /// Filter files by quarter (1-4); requires --year
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=4))]
    pub quarter: Option<u8>,

    /// Only list available files without downloading
    #[arg(long)]
    pub list_only: bool,

    /// First year to probe [default: 2013]
    #[arg(long, value_name = "YEAR")]
    pub first_year: Option<i32>,

    /// Last year to probe [default: current year]
    #[arg(long, value_name = "YEAR")]
    pub last_year: Option<i32>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Logging level forced by flags, if any
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::TRACE)
        } else if self.global.verbose {
            Some(tracing::Level::DEBUG)
        } else {
            None
        }
    }

    /// Level in effect: a verbosity flag wins over the configured level
    pub fn effective_log_level(&self, configured: &str) -> String {
        self.log_level()
            .map(|level| level.to_string().to_lowercase())
            .unwrap_or_else(|| configured.to_string())
    }
}

impl FetchArgs {
    /// Check argument combinations clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if let (Some(first), Some(last)) = (self.first_year, self.last_year) {
            if first > last {
                return Err(format!(
                    "--first-year {} must not be after --last-year {}",
                    first, last
                ));
            }
        }
        Ok(())
    }

    /// Quarter is only honoured together with a year
    pub fn quarter_ignored(&self) -> bool {
        self.quarter.is_some() && self.year.is_none()
    }

    /// Configuration overrides carried by these arguments
    pub fn overrides(&self) -> Overrides {
        Overrides {
            base_url: self.url.clone(),
            output_dir: self.output_dir.clone(),
            first_year: self.first_year,
            last_year: self.last_year,
        }
    }
}
