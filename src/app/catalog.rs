//! Archive discovery by probing the fixed monthly filename grid
//!
//! The archive exposes no listing API, so discovery walks every
//! `(year, month)` pair in a bounded range, asks a [`Prober`] whether the
//! corresponding object exists, and keeps the hits.

use std::future::Future;
use std::ops::RangeInclusive;

use tracing::{debug, info, warn};
use url::Url;

use crate::app::models::{archive_filename, format_megabytes, Catalog, FileRecord};
use crate::constants::archive;
use crate::errors::ProbeResult;

/// Metadata-only existence check for a remote object
///
/// Implementations return `Ok(Some(size))` when the object exists (size 0 if
/// the host did not declare one), `Ok(None)` when the host answered with any
/// status other than "found", and `Err` for transport failures.
pub trait Prober {
    fn probe(&self, url: &Url) -> impl Future<Output = ProbeResult<Option<u64>>> + Send;
}

impl<P: Prober + Sync> Prober for &P {
    fn probe(&self, url: &Url) -> impl Future<Output = ProbeResult<Option<u64>>> + Send {
        (**self).probe(url)
    }
}

/// Naming scheme of the remote archive
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveLayout {
    base_url: Url,
    dataset: String,
}

impl ArchiveLayout {
    /// Create a layout, normalising the base URL to end with `/`
    ///
    /// Without the trailing slash, joining a filename would replace the last
    /// path segment of the base instead of appending to it.
    pub fn new(mut base_url: Url, dataset: impl Into<String>) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            dataset: dataset.into(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Filename for a `(year, month)` pair
    pub fn filename(&self, year: i32, month: u32) -> String {
        archive_filename(&self.dataset, year, month)
    }

    /// Resolved URL for a filename
    pub fn url_for(&self, filename: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(filename)
    }
}

impl Default for ArchiveLayout {
    fn default() -> Self {
        let base_url = Url::parse(archive::BASE_URL).expect("default base URL is valid");
        Self::new(base_url, archive::DATASET)
    }
}

/// Drives a [`Prober`] over the candidate grid and assembles a [`Catalog`]
#[derive(Debug)]
pub struct CatalogBuilder<P> {
    prober: P,
    layout: ArchiveLayout,
    years: RangeInclusive<i32>,
}

impl<P: Prober> CatalogBuilder<P> {
    /// Create a builder probing every month of `years`
    ///
    /// The prober is held for the whole run, so one connection pool serves
    /// every probe.
    pub fn new(prober: P, layout: ArchiveLayout, years: RangeInclusive<i32>) -> Self {
        Self {
            prober,
            layout,
            years,
        }
    }

    pub fn layout(&self) -> &ArchiveLayout {
        &self.layout
    }

    /// Number of `(year, month)` candidates this builder will probe
    pub fn candidate_count(&self) -> usize {
        self.years.clone().count() * archive::MONTHS_PER_YEAR as usize
    }

    /// Probe the full grid and collect every positive result
    ///
    /// Probe failures count as absence. An empty catalog is a valid result.
    pub async fn build(&self) -> Catalog {
        let mut discovered = Vec::new();
        let mut probed = 0usize;

        for year in self.years.clone() {
            for month in 1..=archive::MONTHS_PER_YEAR {
                let filename = self.layout.filename(year, month);
                let url = match self.layout.url_for(&filename) {
                    Ok(url) => url,
                    Err(e) => {
                        warn!("Cannot resolve URL for {}: {}", filename, e);
                        continue;
                    }
                };

                probed += 1;
                let size_bytes = match self.prober.probe(&url).await {
                    Ok(Some(size)) => size,
                    // Non-found status and transport failures both mean "not there"
                    Ok(None) | Err(_) => continue,
                };

                let record = FileRecord::new(filename, url, size_bytes, year, month);
                info!(
                    "Found file: {} ({} MB)",
                    record.filename,
                    format_megabytes(record.size_megabytes())
                );
                discovered.push(record);
            }
        }

        debug!(
            "Discovery probed {} candidates, found {}",
            probed,
            discovered.len()
        );
        Catalog::new(discovered)
    }
}
