//! HTTP backend over the alarm server's JSON API.
//!
//! Every request is a plain GET of `base_url + endpoint`; the body is handed
//! to the engine as text and parsed there, so a malformed body is never an
//! error at this layer.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use alarmwatch_adapters::http::HttpBackend;
//! use alarmwatch_engine::{AlarmWatch, TracingSink};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = HttpBackend::builder()
//!         .base_url("http://backend.local:8000")
//!         .timeout(Duration::from_secs(5))
//!         .build()?;
//!
//!     let handle = AlarmWatch::builder(Arc::new(backend), Arc::new(TracingSink))
//!         .build()
//!         .start()
//!         .await;
//!
//!     tokio::signal::ctrl_c().await?;
//!     handle.stop().await;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use alarmwatch_engine::{Backend, BackendError};
use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::trace;

use crate::AdapterError;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`Backend`] implementation over reqwest.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a new builder for configuring the backend.
    pub fn builder() -> HttpBackendBuilder {
        HttpBackendBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for `endpoint`. Absolute URLs are used unchanged.
    pub fn url_for(&self, endpoint: &str) -> String {
        join_url(&self.base_url, endpoint)
    }

    /// GET `endpoint` and return the body text.
    pub async fn fetch(&self, endpoint: &str) -> Result<String, AdapterError> {
        let url = self.url_for(endpoint);
        trace!("GET {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(AdapterError::Http(format!(
                "API returned status {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AdapterError::Parse(e.to_string()))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn get(&self, endpoint: &str) -> Result<String, BackendError> {
        Ok(self.fetch(endpoint).await?)
    }
}

/// Builder for HttpBackend.
#[derive(Debug, Default)]
pub struct HttpBackendBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl HttpBackendBuilder {
    /// Set the server base URL (default: "http://localhost:8000").
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the backend.
    ///
    /// Fails if the base URL is not an absolute http(s) URL or the client
    /// cannot be constructed.
    pub fn build(self) -> Result<HttpBackend, AdapterError> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let parsed =
            Url::parse(&base_url).map_err(|e| AdapterError::InvalidUrl(format!("{base_url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AdapterError::InvalidUrl(format!(
                "{base_url}: unsupported scheme {}",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;

        Ok(HttpBackend {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

// Join base and endpoint with exactly one slash between them
fn join_url(base: &str, endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        return endpoint.to_string();
    }
    let base = base.trim_end_matches('/');
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", base, endpoint)
}
