//! Divvy Fetcher Library
//!
//! Discovers which monthly Divvy trip data archives exist on the public object
//! store, narrows them by year and quarter, and mirrors the selection into a
//! local directory, skipping files that are already complete.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};

#[cfg(test)]
mod tests {
    use super::*;
    use constants::*;

    #[test]
    fn test_constants_accessible() {
        assert_eq!(FIRST_YEAR, 2013);
        assert_eq!(DOWNLOAD_CHUNK_SIZE, 8192);
        assert!(USER_AGENT.contains("Divvy-Fetcher"));
    }

    #[test]
    fn test_error_types() {
        let filter_error = errors::FilterError::InvalidQuarter { value: 7 };
        let app_error = AppError::Filter(filter_error);

        assert_eq!(app_error.category(), "filter");
    }
}
