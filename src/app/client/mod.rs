//! HTTP client for the trip data object store
//!
//! [`ArchiveClient`] holds one reqwest connection pool and serves as both the
//! [`Prober`] used during discovery and the [`ContentSource`] used for
//! downloads.
//!
//! The module is organized into:
//! - `config`: HTTP client configuration and building
//! - `http`: rate-limited raw requests

use futures::StreamExt;
use url::Url;

use crate::app::catalog::Prober;
use crate::app::download::{ContentSource, RemoteContent};
use crate::constants::http as http_constants;
use crate::errors::{ConfigResult, DownloadError, DownloadResult, ProbeError, ProbeResult};

pub mod config;
pub mod http;

pub use config::ClientConfig;

use http::{declared_length, HttpHandler};

/// HTTP client for the public trip data archive
#[derive(Debug)]
pub struct ArchiveClient {
    http_handler: HttpHandler,
    config: ClientConfig,
}

impl ArchiveClient {
    /// Creates a client with default settings
    pub fn new() -> ConfigResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a client with custom configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the HTTP client cannot be built or the rate
    /// limit is zero
    pub fn with_config(config: ClientConfig) -> ConfigResult<Self> {
        let client = config.build_http_client()?;
        let http_handler = HttpHandler::new(client, config.rate_limit_rps)?;

        tracing::debug!(
            "Created archive client (probe timeout {:?}, {} req/s)",
            config.probe_timeout,
            config.rate_limit_rps
        );

        Ok(Self {
            http_handler,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Prober for ArchiveClient {
    async fn probe(&self, url: &Url) -> ProbeResult<Option<u64>> {
        let response = self
            .http_handler
            .head(url, self.config.probe_timeout)
            .await
            .map_err(|source| ProbeError::Http {
                url: url.to_string(),
                source,
            })?;

        if response.status().as_u16() != http_constants::FOUND_STATUS {
            return Ok(None);
        }
        Ok(Some(declared_length(response.headers())))
    }
}

impl ContentSource for ArchiveClient {
    async fn fetch(&self, url: &Url) -> DownloadResult<RemoteContent> {
        let response = self.http_handler.get(url).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::ServerError {
                status: status.as_u16(),
            });
        }

        let content_length = response.content_length();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(DownloadError::Http))
            .boxed();

        Ok(RemoteContent {
            content_length,
            body,
        })
    }
}
