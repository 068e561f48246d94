//! Configuration error types.

use thiserror::Error;

use crate::RequestId;

/// Errors that can occur while resolving or reading a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A remote document could not be retrieved (non-200 status, oversized body).
    #[error("Unable to retrieve config file {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Document content is not valid YAML, or not a mapping.
    #[error("Parse error in {location}: {message}")]
    Parse { location: String, message: String },

    /// A referenced local document does not exist.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// The EXTENDS chain loops back onto a document already being expanded.
    #[error("Cyclic EXTENDS chain: {}", .chain.join(" -> "))]
    CyclicExtends { chain: Vec<String> },

    /// Accessor or mutator called before the request was initialized.
    #[error("Config has not been initialized for request {0}")]
    NotInitialized(RequestId),

    /// A value looked like a JSON array or shell words but failed to parse.
    #[error("Malformed list value for {key}: {message}")]
    MalformedList { key: String, message: String },

    /// HTTP transport error (connection refused, timeout, ...).
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Creates a fetch error.
    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Creates a malformed list error.
    pub fn malformed_list(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedList {
            key: key.into(),
            message: message.into(),
        }
    }
}
