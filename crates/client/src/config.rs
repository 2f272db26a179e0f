//! Client configuration.

use std::env;
use std::time::Duration;

use cart::RetryPolicy;
use url::Url;

use crate::error::ClientError;

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Connection settings shared by every client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root URL of the storefront server.
    pub base_url: Url,
    /// Per-request timeout. Exceeding it is a transient failure.
    pub request_timeout: Duration,
    /// Extra attempts for a failed cart fetch.
    pub cart_fetch_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cart_fetch_retries: 1,
        }
    }
}

impl ClientConfig {
    /// Creates a configuration for a server at `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            ..Self::default()
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// - `STOREFRONT_API_URL` (default `http://localhost:3000`)
    /// - `STOREFRONT_TIMEOUT_SECS` (default 10)
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url = match env::var("STOREFRONT_API_URL") {
            Ok(url) => Url::parse(&url)?,
            Err(_) => Url::parse(DEFAULT_BASE_URL)?,
        };
        let timeout_secs = env::var("STOREFRONT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            ..Self::default()
        })
    }

    /// Sets the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Returns the retry policy for cart fetches.
    pub fn fetch_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.cart_fetch_retries + 1, Duration::from_millis(200))
    }

    pub(crate) fn http_client(&self) -> Result<reqwest::Client, ClientError> {
        Ok(reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()?)
    }
}
