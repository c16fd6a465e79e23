//! Application constants for Divvy Fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// Environment variable names for configuration overrides
pub mod env {
    /// Overrides the archive base URL
    pub const BASE_URL: &str = "DIVVY_BASE_URL";

    /// Overrides the local output directory
    pub const OUTPUT_DIR: &str = "DIVVY_OUTPUT_DIR";

    /// Overrides the dataset name used in archive filenames
    pub const DATASET: &str = "DIVVY_DATASET";
}

/// Remote archive layout
pub mod archive {
    /// Publicly known Divvy trip data bucket
    pub const BASE_URL: &str = "https://divvy-tripdata.s3.amazonaws.com/";

    /// Dataset segment of the archive filename
    pub const DATASET: &str = "divvy";

    /// Suffix shared by every monthly archive
    pub const FILENAME_SUFFIX: &str = "tripdata.zip";

    /// First year the archive published monthly files
    pub const FIRST_YEAR: i32 = 2013;

    /// Months per year in the candidate grid
    pub const MONTHS_PER_YEAR: u32 = 12;
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "Divvy-Fetcher/0.1.0 (Trip Data Mirror)";

    /// Upper bound on a single existence probe
    pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// TCP keep-alive interval
    pub const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Status code the object store returns for an existing object
    pub const FOUND_STATUS: u16 = 200;
}

/// Request pacing
pub mod limits {
    /// Default rate limit for archive requests (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 15;
}

/// File operation constants
pub mod files {
    /// Default local directory for downloaded archives
    pub const DEFAULT_OUTPUT_DIR: &str = "data";

    /// Write and progress granularity for streamed transfers (8KB)
    pub const DOWNLOAD_CHUNK_SIZE: usize = 8 * 1024;

    /// Bytes per megabyte for size reporting
    pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
}

/// Configuration file discovery
pub mod config {
    /// Project-local configuration file name
    pub const LOCAL_FILE_NAME: &str = "divvy-fetcher.toml";

    /// Directory under the user config dir
    pub const APP_DIR_NAME: &str = "divvy-fetcher";

    /// File name under the user config dir
    pub const USER_FILE_NAME: &str = "config.toml";
}

// Re-export commonly used constants for convenience
pub use archive::{BASE_URL as DEFAULT_BASE_URL, DATASET as DEFAULT_DATASET, FIRST_YEAR};
pub use files::{DEFAULT_OUTPUT_DIR, DOWNLOAD_CHUNK_SIZE};
pub use http::{PROBE_TIMEOUT, USER_AGENT};
pub use limits::DEFAULT_RATE_LIMIT_RPS;
