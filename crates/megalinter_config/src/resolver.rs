//! Resolution of a request's configuration.
//!
//! Precedence, lowest to highest:
//!
//! 1. Documents inherited through `EXTENDS`
//! 2. The primary configuration file (discovered, named, or remote)
//! 3. Environment variables
//! 4. Caller-supplied parameters

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::extends::{EXTENDS_KEY, ExtendsResolver};
use crate::http_client::HttpClient;
use crate::source::{ConfigLocation, SourceLoader};
use crate::store::{ConfigStore, RunConfig};
use crate::{ConfigError, ConfigMapping, RequestId};

/// Key naming an explicit configuration file (local name or URL).
pub const CONFIG_FILE_KEY: &str = "MEGALINTER_CONFIG";

/// Conventional configuration file names, in discovery order.
pub const CONFIG_FILE_CANDIDATES: [&str; 4] = [
    ".mega-linter.yml",
    ".megalinter.yml",
    ".mega-linter.yaml",
    ".megalinter.yaml",
];

/// Computes run configurations and publishes them into a [`ConfigStore`].
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    store: Arc<ConfigStore>,
    loader: SourceLoader,
}

impl ConfigResolver {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self {
            store,
            loader: SourceLoader::new(),
        }
    }

    /// Use a custom HTTP client for remote documents.
    pub fn with_http_client(mut self, http_client: HttpClient) -> Self {
        self.loader = self.loader.with_http_client(http_client);
        self
    }

    /// Directory where remote documents are persisted.
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.loader = self.loader.with_temp_dir(temp_dir);
        self
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Resolves and stores the configuration of `id`.
    ///
    /// If `id` is already initialized, `params` are merged over the stored
    /// mapping and nothing is re-read. Concurrent calls for the same `id`
    /// run one after the other; readers of `id` wait until the result is
    /// published. On error nothing is stored for `id`.
    ///
    /// Blocks on file and network I/O.
    pub fn init(
        &self,
        id: &RequestId,
        workspace: Option<&Path>,
        params: ConfigMapping,
    ) -> Result<(), ConfigError> {
        self.store.with_slot(id, |slot| {
            if let Some(run) = slot.as_mut() {
                run.mapping.extend(params);
                debug!("[config] Already initialized: {}", run.source_description);
                return Ok(());
            }

            let run = self.resolve(workspace, params)?;
            for line in run.source_description.lines() {
                info!("[config] {}", line);
            }
            *slot = Some(run);
            Ok(())
        })
    }

    /// Computes a run configuration without touching the store.
    pub fn resolve(
        &self,
        workspace: Option<&Path>,
        params: ConfigMapping,
    ) -> Result<RunConfig, ConfigError> {
        let mut env_plus_params = self.store.environment().snapshot();
        env_plus_params.extend(params);

        let explicit = env_plus_params
            .get(CONFIG_FILE_KEY)
            .map(|value| value.to_env_string());

        if workspace.is_none() && explicit.is_none() {
            return Ok(RunConfig {
                mapping: env_plus_params,
                source_description: "Environment variables only (no workspace)".to_string(),
            });
        }

        let base_dir = workspace.map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let location = match &explicit {
            Some(name) => ConfigLocation::resolve(name, &base_dir),
            None => discover_config(&base_dir),
        };

        let (base, origin, mut source_description) = match self.loader.load(&location)? {
            Some(document) => {
                let mut merged = document.mapping;
                merged.extend(env_plus_params);
                let description = format!("{} + Environment variables", document.path.display());
                (merged, Some(&location), description)
            }
            None if explicit.is_some() => {
                return Err(ConfigError::NotFound(location.display()));
            }
            None => {
                let description = format!(
                    "Environment variables only (no config file found in {})",
                    base_dir.display()
                );
                (env_plus_params, None, description)
            }
        };

        if !base.contains_key(EXTENDS_KEY) {
            return Ok(RunConfig {
                mapping: base,
                source_description,
            });
        }

        let resolution = ExtendsResolver::new(&self.loader, &base_dir).resolve(&base, origin)?;
        for line in &resolution.provenance {
            source_description.push('\n');
            source_description.push_str(line);
        }

        Ok(RunConfig {
            mapping: resolution.mapping,
            source_description,
        })
    }
}

/// First conventional config file present in `dir`, or the first candidate
/// name when none exists.
pub fn discover_config(dir: &Path) -> ConfigLocation {
    let found = CONFIG_FILE_CANDIDATES
        .iter()
        .map(|candidate| dir.join(candidate))
        .find(|path| path.is_file());

    match found {
        Some(path) => {
            debug!("Found config file {}", path.display());
            ConfigLocation::Local(path)
        }
        None => ConfigLocation::Local(dir.join(CONFIG_FILE_CANDIDATES[0])),
    }
}
