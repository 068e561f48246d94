//! Configuration document loading from local paths and remote URLs.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use url::Url;

use crate::http_client::HttpClient;
use crate::{ConfigError, ConfigMapping, ConfigValue};

/// File name used when a remote URL has no usable final path segment.
const FALLBACK_REMOTE_NAME: &str = "mega-linter-remote.yml";

/// Where a configuration document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLocation {
    /// Local filesystem path.
    Local(PathBuf),
    /// `http://` or `https://` URL.
    Remote(String),
}

impl ConfigLocation {
    /// Classifies `raw`, resolving local paths against `base_dir`.
    pub fn resolve(raw: &str, base_dir: &Path) -> Self {
        if is_remote(raw) {
            Self::Remote(raw.to_string())
        } else {
            Self::Local(base_dir.join(raw))
        }
    }

    /// Human-readable form used in provenance lines and errors.
    pub fn display(&self) -> String {
        match self {
            Self::Local(path) => path.display().to_string(),
            Self::Remote(url) => url.clone(),
        }
    }
}

/// Returns true when `location` carries an HTTP(S) scheme prefix.
pub fn is_remote(location: &str) -> bool {
    location.starts_with("https://") || location.starts_with("http://")
}

/// A parsed document together with the file it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    /// Local path, or the temp file a remote document was persisted to.
    pub path: PathBuf,
    pub mapping: ConfigMapping,
}

/// Loads configuration documents.
#[derive(Debug, Clone)]
pub struct SourceLoader {
    http_client: HttpClient,
    temp_dir: PathBuf,
}

impl Default for SourceLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceLoader {
    pub fn new() -> Self {
        Self {
            http_client: HttpClient::default(),
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Use a custom HTTP client for remote documents.
    pub fn with_http_client(mut self, http_client: HttpClient) -> Self {
        self.http_client = http_client;
        self
    }

    /// Directory where remote documents are persisted before parsing.
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    /// Loads the document at `location`.
    ///
    /// Returns `Ok(None)` when a local file does not exist. Remote documents
    /// are always present or fail with [`ConfigError::Fetch`].
    pub fn load(&self, location: &ConfigLocation) -> Result<Option<LoadedDocument>, ConfigError> {
        match location {
            ConfigLocation::Local(path) => self.load_local(path),
            ConfigLocation::Remote(url) => self.load_remote(url).map(Some),
        }
    }

    fn load_local(&self, path: &Path) -> Result<Option<LoadedDocument>, ConfigError> {
        if !path.is_file() {
            return Ok(None);
        }

        debug!("Loading config file {}", path.display());
        let content = fs::read_to_string(path)?;
        let mapping = parse_document(&content, &path.display().to_string())?;

        Ok(Some(LoadedDocument {
            path: path.to_path_buf(),
            mapping,
        }))
    }

    fn load_remote(&self, url: &str) -> Result<LoadedDocument, ConfigError> {
        let persisted = self.persist_path(url)?;
        let bytes = self.http_client.fetch(url)?;

        fs::write(&persisted, &bytes)?;
        debug!("Saved remote config {} to {}", url, persisted.display());

        let content = String::from_utf8(bytes)
            .map_err(|e| ConfigError::parse(url, format!("invalid UTF-8: {}", e)))?;
        let mapping = parse_document(&content, url)?;

        Ok(LoadedDocument {
            path: persisted,
            mapping,
        })
    }

    /// Temp file a remote document is written to, named after the URL's
    /// final path segment.
    ///
    /// URLs sharing a final segment share this file, so concurrent requests
    /// may overwrite each other's copy. The copy is informational only: the
    /// mapping returned by [`SourceLoader::load`] is parsed from the fetched
    /// bytes, never read back from disk.
    pub fn persist_path(&self, url: &str) -> Result<PathBuf, ConfigError> {
        let parsed =
            Url::parse(url).map_err(|e| ConfigError::fetch(url, format!("invalid URL: {}", e)))?;

        let name = parsed
            .path_segments()
            .and_then(|segments| segments.last())
            .filter(|segment| !segment.is_empty())
            .unwrap_or(FALLBACK_REMOTE_NAME);

        Ok(self.temp_dir.join(name))
    }
}

/// Parses YAML `content` into a mapping.
///
/// Empty and whitespace-only documents (and a bare `null`) yield an empty
/// mapping. A top-level scalar or sequence is a parse error.
pub fn parse_document(content: &str, location: &str) -> Result<ConfigMapping, ConfigError> {
    if content.trim().is_empty() {
        return Ok(ConfigMapping::new());
    }

    let raw: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| ConfigError::parse(location, e.to_string()))?;

    match ConfigValue::from(raw) {
        ConfigValue::Map(mapping) => Ok(mapping),
        ConfigValue::Null => Ok(ConfigMapping::new()),
        _ => Err(ConfigError::parse(
            location,
            "top-level document must be a mapping",
        )),
    }
}
