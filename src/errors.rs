//! Error types for Divvy Fetcher
//!
//! Probe and per-file download failures are contained by the components that
//! produce them; only configuration problems and invalid filter arguments
//! reach the top level as hard errors.

use std::path::PathBuf;
use thiserror::Error;

/// Existence probe errors
///
/// The catalog builder treats every one of these as "file absent".
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Transport failure: connection refused, DNS, timeout
    #[error("Existence check failed for {url}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Catalog filtering errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FilterError {
    /// Quarter outside 1..=4
    #[error("Invalid quarter {value}: quarter must be 1, 2, 3, or 4")]
    InvalidQuarter { value: u8 },
}

/// Download and HTTP client errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error during file operations
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Server returned a non-success status
    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    /// Body ended before the declared length was reached, or overran it
    #[error("Incomplete download: received {received} bytes, expected {expected} bytes")]
    IncompleteDownload { received: u64, expected: u64 },

    /// Generic error for other issues
    #[error("{0}")]
    Other(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Explicitly requested configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// HTTP client could not be constructed from the configuration
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Probe error
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// Filter error
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Probe(_) => "probe",
            AppError::Filter(_) => "filter",
            AppError::Download(_) => "download",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Probe result type alias
pub type ProbeResult<T> = std::result::Result<T, ProbeError>;

/// Filter result type alias
pub type FilterResult<T> = std::result::Result<T, FilterError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let filter_error = AppError::from(FilterError::InvalidQuarter { value: 5 });
        assert_eq!(filter_error.category(), "filter");

        let download_error = AppError::from(DownloadError::ServerError { status: 403 });
        assert_eq!(download_error.category(), "download");

        assert_eq!(AppError::generic("boom").category(), "generic");
    }

    #[test]
    fn test_error_messages() {
        let error = FilterError::InvalidQuarter { value: 5 };
        assert_eq!(
            error.to_string(),
            "Invalid quarter 5: quarter must be 1, 2, 3, or 4"
        );

        let error = DownloadError::IncompleteDownload {
            received: 10,
            expected: 20,
        };
        assert!(error.to_string().contains("received 10 bytes"));
    }
}
