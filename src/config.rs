//! Configuration management for Divvy Fetcher
//!
//! Settings come from, in increasing precedence: built-in defaults, a TOML
//! file, environment variables, then command-line flags. The merged result is
//! converted once into [`FetcherConfig`] and [`ClientConfig`] and passed to the
//! core explicitly.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::app::{ArchiveLayout, ClientConfig};
use crate::constants::{archive, config as config_files, env, files, http, limits};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Remote archive and local mirror settings
    pub archive: ArchiveConfigToml,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly archive configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArchiveConfigToml {
    /// Base URL of the object store
    pub base_url: String,
    /// Dataset segment of archive filenames
    pub dataset: String,
    /// Local directory for downloaded archives
    pub output_dir: PathBuf,
    /// First year to probe
    pub first_year: i32,
    /// Last year to probe (None = current calendar year)
    pub last_year: Option<i32>,
}

impl Default for ArchiveConfigToml {
    fn default() -> Self {
        Self {
            base_url: archive::BASE_URL.to_string(),
            dataset: archive::DATASET.to_string(),
            output_dir: PathBuf::from(files::DEFAULT_OUTPUT_DIR),
            first_year: archive::FIRST_YEAR,
            last_year: None,
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Existence probe timeout, e.g. "5s"
    #[serde(with = "humantime_serde")]
    pub probe_timeout: Duration,
    /// Connect timeout, e.g. "30s"
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// TCP keep-alive (None = disabled)
    #[serde(with = "humantime_serde")]
    pub tcp_keepalive: Option<Duration>,
    /// Connection pool idle timeout (None = no timeout)
    #[serde(with = "humantime_serde")]
    pub pool_idle_timeout: Option<Duration>,
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
    /// User agent string
    pub user_agent: String,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            probe_timeout: http::PROBE_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            tcp_keepalive: Some(http::TCP_KEEPALIVE),
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            tcp_nodelay: true,
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
            user_agent: http::USER_AGENT.to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no verbosity flag is given (error, warn, info, debug, trace)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Command-line values that override file and environment settings
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
}

/// Runtime configuration for discovery and download
#[derive(Debug, Clone, PartialEq)]
pub struct FetcherConfig {
    /// Archive naming scheme (normalised base URL + dataset)
    pub layout: ArchiveLayout,
    /// Local target directory
    pub output_dir: PathBuf,
    /// Candidate years, inclusive
    pub years: RangeInclusive<i32>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            layout: ArchiveLayout::default(),
            output_dir: PathBuf::from(files::DEFAULT_OUTPUT_DIR),
            years: archive::FIRST_YEAR..=current_year(),
        }
    }
}

/// Current UTC calendar year
pub fn current_year() -> i32 {
    chrono::Utc::now().year()
}

impl AppConfig {
    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (explicit path, or the first found in standard locations)
    /// 3. Environment variables
    ///
    /// Command-line overrides are applied separately with [`AppConfig::apply_overrides`].
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound { path }),
            Some(path) => Some(path),
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(config_files::LOCAL_FILE_NAME)];
        if let Some(user_path) = Self::user_config_path() {
            search_paths.push(user_path);
        }

        let found = search_paths.into_iter().find(|path| path.exists());
        match &found {
            Some(path) => debug!("Found config file: {}", path.display()),
            None => debug!("No config file found in standard locations"),
        }
        found
    }

    /// Config file path for the current user
    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join(config_files::APP_DIR_NAME)
                .join(config_files::USER_FILE_NAME)
        })
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base_url) = lookup(env::BASE_URL) {
            debug!("Base URL overridden by {}", env::BASE_URL);
            self.archive.base_url = base_url;
        }
        if let Some(output_dir) = lookup(env::OUTPUT_DIR) {
            debug!("Output directory overridden by {}", env::OUTPUT_DIR);
            self.archive.output_dir = PathBuf::from(output_dir);
        }
        if let Some(dataset) = lookup(env::DATASET) {
            debug!("Dataset overridden by {}", env::DATASET);
            self.archive.dataset = dataset;
        }
    }

    /// Apply command-line overrides
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(base_url) = &overrides.base_url {
            self.archive.base_url = base_url.clone();
        }
        if let Some(output_dir) = &overrides.output_dir {
            self.archive.output_dir = output_dir.clone();
        }
        if let Some(first_year) = overrides.first_year {
            self.archive.first_year = first_year;
        }
        if let Some(last_year) = overrides.last_year {
            self.archive.last_year = Some(last_year);
        }
    }

    /// Convert to the runtime fetcher configuration
    pub fn fetcher_config(&self) -> ConfigResult<FetcherConfig> {
        self.archive.to_runtime_config()
    }

    /// Convert to the runtime client configuration
    pub fn client_config(&self) -> ClientConfig {
        self.client.to_runtime_config()
    }
}

impl ArchiveConfigToml {
    /// Convert to runtime FetcherConfig, validating URL and year range
    pub fn to_runtime_config(&self) -> ConfigResult<FetcherConfig> {
        let base_url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidValue {
            field: "archive.base_url".to_string(),
            value: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                field: "archive.base_url".to_string(),
                value: self.base_url.clone(),
                reason: "Only http and https URLs are supported".to_string(),
            });
        }

        if self.dataset.is_empty() || self.dataset.contains('/') {
            return Err(ConfigError::InvalidValue {
                field: "archive.dataset".to_string(),
                value: self.dataset.clone(),
                reason: "Dataset must be a non-empty name without slashes".to_string(),
            });
        }

        let last_year = self.last_year.unwrap_or_else(current_year);
        if self.first_year > last_year {
            return Err(ConfigError::InvalidValue {
                field: "archive.first_year".to_string(),
                value: self.first_year.to_string(),
                reason: format!("First year must not be after last year {}", last_year),
            });
        }

        Ok(FetcherConfig {
            layout: ArchiveLayout::new(base_url, self.dataset.clone()),
            output_dir: self.output_dir.clone(),
            years: self.first_year..=last_year,
        })
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            probe_timeout: self.probe_timeout,
            connect_timeout: self.connect_timeout,
            tcp_keepalive: self.tcp_keepalive,
            tcp_nodelay: self.tcp_nodelay,
            pool_idle_timeout: self.pool_idle_timeout,
            rate_limit_rps: self.rate_limit_rps,
            user_agent: self.user_agent.clone(),
        }
    }
}
