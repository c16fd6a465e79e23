//! Prelude module for Divvy Fetcher Library
//!
//! Re-exports the items needed for typical usage with a single
//! `use divvy_fetcher::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use divvy_fetcher::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = FetcherConfig::default();
//!     let client = ArchiveClient::new()?;
//!     let catalog = CatalogBuilder::new(&client, config.layout.clone(), config.years.clone())
//!         .build()
//!         .await;
//!     let summary = DownloadExecutor::new(&client)
//!         .download_all(catalog.records(), &config.output_dir)
//!         .await;
//!     println!("{} files mirrored", summary.succeeded());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Discovery, filtering and download
pub use crate::app::{
    filter_by_quarter, filter_by_year, ArchiveClient, ArchiveLayout, Catalog, CatalogBuilder,
    ClientConfig, ContentSource, DownloadExecutor, DownloadSummary, FileOutcome, FileRecord,
    ProgressObserver, Prober, Quarter, TransferEvent,
};

// Configuration
pub use crate::config::{AppConfig, FetcherConfig};

// Commonly used constants
pub use crate::constants::{DEFAULT_BASE_URL, DEFAULT_OUTPUT_DIR, FIRST_YEAR, USER_AGENT};

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};

// Re-export the runtime so examples and integrations share one version
pub use tokio;
