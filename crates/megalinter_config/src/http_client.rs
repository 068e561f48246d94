//! Blocking HTTP client for remote configuration documents.

use std::io::Read;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use tracing::{debug, warn};

use crate::ConfigError;

/// Default timeout for HTTP requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default maximum size of a fetched document (10MB).
pub const DEFAULT_MAX_BODY_SIZE: u64 = 10 * 1024 * 1024;

/// HTTP client with a bounded timeout and body size.
///
/// The underlying connection pool is built on first fetch and shared by
/// every clone.
#[derive(Debug, Clone)]
pub struct HttpClient {
    timeout: Duration,
    max_body_size: u64,
    client: Arc<OnceLock<Client>>,
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_body_size: u64,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl HttpClient {
    /// Create a new builder for HttpClient.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder {
            timeout: DEFAULT_TIMEOUT,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Fetch the body of `url`. Anything but `200 OK` is a fetch error.
    ///
    /// Blocks the calling thread; never call it from inside an async task.
    pub fn fetch(&self, url: &str) -> Result<Vec<u8>, ConfigError> {
        debug!("Fetching {}", url);

        let response = self.client()?.get(url).send().map_err(|e| {
            warn!("Request to {} failed: {}", url, e);
            ConfigError::from(e)
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ConfigError::fetch(url, format!("HTTP status {}", status)));
        }

        if let Some(len) = response.content_length()
            && len > self.max_body_size
        {
            return Err(ConfigError::fetch(
                url,
                format!("response too large: {} bytes (max {})", len, self.max_body_size),
            ));
        }

        let mut body = Vec::new();
        let read = response
            .take(self.max_body_size + 1)
            .read_to_end(&mut body)?;
        if read as u64 > self.max_body_size {
            return Err(ConfigError::fetch(
                url,
                format!("response too large: exceeds {} bytes", self.max_body_size),
            ));
        }

        Ok(body)
    }

    fn client(&self) -> Result<&Client, ConfigError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = Client::builder().timeout(self.timeout).build()?;
        Ok(self.client.get_or_init(|| client))
    }
}

impl HttpClientBuilder {
    /// Set timeout for HTTP requests.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set maximum accepted body size in bytes.
    pub fn max_body_size(mut self, max: u64) -> Self {
        self.max_body_size = max;
        self
    }

    /// Build the HttpClient.
    pub fn build(self) -> HttpClient {
        HttpClient {
            timeout: self.timeout,
            max_body_size: self.max_body_size,
            client: Arc::new(OnceLock::new()),
        }
    }
}
