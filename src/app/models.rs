//! Data models for discovered archive files
//!
//! A [`FileRecord`] describes one monthly archive that the remote host confirmed
//! to exist. A [`Catalog`] is the ordered, immutable set of those records
//! produced by one discovery run.

use std::fmt;

use url::Url;

use crate::constants::{archive, files};
use crate::errors::FilterError;

/// Derive the archive filename for a `(year, month)` pair
///
/// ```
/// use divvy_fetcher::app::models::archive_filename;
///
/// assert_eq!(archive_filename("divvy", 2021, 3), "202103-divvy-tripdata.zip");
/// ```
pub fn archive_filename(dataset: &str, year: i32, month: u32) -> String {
    format!(
        "{}{:02}-{}-{}",
        year,
        month,
        dataset,
        archive::FILENAME_SUFFIX
    )
}

/// Convert a byte count to megabytes rounded to two decimal places
pub fn bytes_to_megabytes(bytes: u64) -> f64 {
    (bytes as f64 / files::BYTES_PER_MB * 100.0).round() / 100.0
}

/// Render a megabyte value with at least one decimal: `10.0`, `10.5`, `10.25`
pub fn format_megabytes(megabytes: f64) -> String {
    if megabytes.fract() == 0.0 {
        format!("{:.1}", megabytes)
    } else {
        megabytes.to_string()
    }
}

/// One remote archive confirmed to exist by an existence probe
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    /// Archive filename, e.g. `202103-divvy-tripdata.zip`
    pub filename: String,
    /// Fully resolved download URL
    pub url: Url,
    /// Declared size in bytes (0 when the host did not report one)
    pub size_bytes: u64,
    /// Data year
    pub year: i32,
    /// Data month, 1-12
    pub month: u32,
}

impl FileRecord {
    /// Create a record for a discovered archive
    pub fn new(filename: String, url: Url, size_bytes: u64, year: i32, month: u32) -> Self {
        debug_assert!((1..=12).contains(&month), "month out of range: {month}");
        Self {
            filename,
            url,
            size_bytes,
            year,
            month,
        }
    }

    /// Declared size in megabytes, rounded to two decimal places
    pub fn size_megabytes(&self) -> f64 {
        bytes_to_megabytes(self.size_bytes)
    }

    /// Sort key used for catalog ordering
    pub fn period(&self) -> (i32, u32) {
        (self.year, self.month)
    }
}

impl fmt::Display for FileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} MB",
            self.filename,
            format_megabytes(self.size_megabytes())
        )
    }
}

/// Ordered set of discovered archives
///
/// Records are always sorted ascending by `(year, month)`. The catalog cannot
/// be mutated after construction; filters produce new catalogs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    records: Vec<FileRecord>,
}

impl Catalog {
    /// Build a catalog, sorting records by `(year, month)`
    pub fn new(mut records: Vec<FileRecord>) -> Self {
        records.sort_by_key(FileRecord::period);
        Self { records }
    }

    /// Build a catalog from records already known to be in order
    pub(crate) fn from_sorted(records: Vec<FileRecord>) -> Self {
        debug_assert!(records.windows(2).all(|w| w[0].period() <= w[1].period()));
        Self { records }
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of the per-record rounded megabyte sizes
    pub fn total_size_megabytes(&self) -> f64 {
        self.records.iter().map(FileRecord::size_megabytes).sum()
    }

    /// Sum of declared sizes in bytes
    pub fn total_size_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.size_bytes).sum()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a FileRecord;
    type IntoIter = std::slice::Iter<'a, FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Calendar quarter: a fixed group of three consecutive months
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    /// Months covered by this quarter
    pub fn months(self) -> [u32; 3] {
        match self {
            Quarter::Q1 => [1, 2, 3],
            Quarter::Q2 => [4, 5, 6],
            Quarter::Q3 => [7, 8, 9],
            Quarter::Q4 => [10, 11, 12],
        }
    }

    pub fn contains(self, month: u32) -> bool {
        self.months().contains(&month)
    }

    pub fn number(self) -> u8 {
        match self {
            Quarter::Q1 => 1,
            Quarter::Q2 => 2,
            Quarter::Q3 => 3,
            Quarter::Q4 => 4,
        }
    }
}

impl TryFrom<u8> for Quarter {
    type Error = FilterError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Quarter::Q1),
            2 => Ok(Quarter::Q2),
            3 => Ok(Quarter::Q3),
            4 => Ok(Quarter::Q4),
            value => Err(FilterError::InvalidQuarter { value }),
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.number())
    }
}
