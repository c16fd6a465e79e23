//! Core application logic for Divvy Fetcher
//!
//! Data flows strictly forward: the [`CatalogBuilder`] probes the archive and
//! produces a [`Catalog`], the filters narrow it by year and quarter, and the
//! [`DownloadExecutor`] mirrors the selection to disk.
//!
//! # Examples
//!
//! ```rust,no_run
//! use divvy_fetcher::app::{
//!     filter_by_quarter, filter_by_year, ArchiveClient, ArchiveLayout, CatalogBuilder,
//!     DownloadExecutor,
//! };
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ArchiveClient::new()?;
//!
//! let catalog = CatalogBuilder::new(&client, ArchiveLayout::default(), 2013..=2024)
//!     .build()
//!     .await;
//! let selected = filter_by_year(&catalog, Some(2021));
//! let selected = filter_by_quarter(&selected, Some(2021), Some(2))?;
//!
//! let summary = DownloadExecutor::new(&client)
//!     .download_all(selected.records(), Path::new("data"))
//!     .await;
//! println!("{} of {} files downloaded", summary.succeeded(), summary.total());
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod download;
pub mod filter;
pub mod models;

// Re-export main public API
pub use catalog::{ArchiveLayout, CatalogBuilder, Prober};
pub use client::{ArchiveClient, ClientConfig};
pub use download::{
    ContentSource, DownloadExecutor, DownloadSummary, FileOutcome, FileReport, NoProgress,
    ProgressObserver, RemoteContent, TransferEvent,
};
pub use filter::{filter_by_quarter, filter_by_year};
pub use models::{archive_filename, Catalog, FileRecord, Quarter};
