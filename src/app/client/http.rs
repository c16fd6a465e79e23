//! Core HTTP operations with rate limiting
//!
//! Every request goes through a client-side rate limiter before it is sent.
//! No retry: one attempt per probe and per download.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::header::{HeaderMap, CONTENT_LENGTH};
use reqwest::{Client, Response};
use url::Url;

use crate::errors::{ConfigError, ConfigResult};

type DirectRateLimiter = RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>;

/// HTTP operations handler
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    rate_limiter: DirectRateLimiter,
}

impl HttpHandler {
    /// Creates a new HttpHandler with the given client and rate limiting
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `rate_limit_rps` is zero
    pub fn new(client: Client, rate_limit_rps: u32) -> ConfigResult<Self> {
        let rate_limiter = Self::build_rate_limiter(rate_limit_rps)?;
        Ok(Self {
            client,
            rate_limiter,
        })
    }

    fn build_rate_limiter(rate_limit_rps: u32) -> ConfigResult<DirectRateLimiter> {
        let rps = NonZeroU32::new(rate_limit_rps).ok_or_else(|| ConfigError::InvalidValue {
            field: "client.rate_limit_rps".to_string(),
            value: rate_limit_rps.to_string(),
            reason: "Rate limit must be non-zero".to_string(),
        })?;
        Ok(RateLimiter::direct(Quota::per_second(rps)))
    }

    async fn pace(&self) {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;
    }

    /// Sends a HEAD request bounded by `timeout`
    pub async fn head(&self, url: &Url, timeout: Duration) -> reqwest::Result<Response> {
        self.pace().await;
        let response = self
            .client
            .head(url.as_str())
            .timeout(timeout)
            .send()
            .await?;
        tracing::trace!("HEAD {} -> {}", url, response.status());
        Ok(response)
    }

    /// Sends a GET request whose body is read later as a stream
    pub async fn get(&self, url: &Url) -> reqwest::Result<Response> {
        self.pace().await;
        let response = self.client.get(url.as_str()).send().await?;
        tracing::debug!("GET {} -> {}", url, response.status());
        Ok(response)
    }
}

/// Size declared by a `Content-Length` header; 0 when absent or not a number
///
/// Read from the header itself: a HEAD response has no body, so the
/// transport's body-length hint is always zero there.
pub fn declared_length(headers: &HeaderMap) -> u64 {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::client::config::ClientConfig;
    use reqwest::header::HeaderValue;

    #[tokio::test]
    async fn test_rate_limiter_creation() {
        let rate_limiter = HttpHandler::build_rate_limiter(5).unwrap();
        rate_limiter.until_ready().await;
    }

    #[test]
    fn test_rate_limiter_zero_fails() {
        let result = HttpHandler::build_rate_limiter(0);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "client.rate_limit_rps"
        ));
    }

    #[test]
    fn test_http_handler_creation() {
        let client = ClientConfig::default().build_http_client().unwrap();
        assert!(HttpHandler::new(client, 5).is_ok());
    }

    #[test]
    fn test_declared_length() {
        let mut headers = HeaderMap::new();
        assert_eq!(declared_length(&headers), 0);

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("7340032"));
        assert_eq!(declared_length(&headers), 7_340_032);

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("unknown"));
        assert_eq!(declared_length(&headers), 0);

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("-12"));
        assert_eq!(declared_length(&headers), 0);
    }
}
