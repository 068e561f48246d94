//! `EXTENDS` inheritance resolution.
//!
//! A document may inherit from one or more ancestor documents, listed under
//! the `EXTENDS` key as a comma-separated string or a list. Ancestors are
//! expanded depth-first in declared order, so later items and deeper
//! documents override earlier ones, and a document's own keys override
//! everything it extends.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::source::{ConfigLocation, SourceLoader};
use crate::{ConfigError, ConfigMapping, ConfigValue};

/// Key naming the ancestors of a document.
pub const EXTENDS_KEY: &str = "EXTENDS";

/// Result of expanding an `EXTENDS` chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendsResolution {
    /// Flattened mapping, ancestors below the document's own keys.
    pub mapping: ConfigMapping,
    /// One `- extends from: <item>` line per expanded item, depth-first.
    pub provenance: Vec<String>,
}

/// Expands `EXTENDS` chains relative to a base directory.
pub struct ExtendsResolver<'a> {
    loader: &'a SourceLoader,
    base_dir: &'a Path,
}

impl<'a> ExtendsResolver<'a> {
    pub fn new(loader: &'a SourceLoader, base_dir: &'a Path) -> Self {
        Self { loader, base_dir }
    }

    /// Flattens `document` with all of its ancestors.
    ///
    /// `origin` is where `document` itself was loaded from, if anywhere; an
    /// ancestor pointing back at it is reported as a cycle.
    pub fn resolve(
        &self,
        document: &ConfigMapping,
        origin: Option<&ConfigLocation>,
    ) -> Result<ExtendsResolution, ConfigError> {
        let mut chain: Vec<String> = origin.map(chain_key).into_iter().collect();
        let (mapping, provenance) = self.expand(document, ConfigMapping::new(), &mut chain)?;

        Ok(ExtendsResolution {
            mapping,
            provenance,
        })
    }

    fn expand(
        &self,
        document: &ConfigMapping,
        mut merged: ConfigMapping,
        chain: &mut Vec<String>,
    ) -> Result<(ConfigMapping, Vec<String>), ConfigError> {
        let mut provenance = Vec::new();

        for item in extends_items(document)? {
            let location = ConfigLocation::resolve(&item, self.base_dir);
            let key = chain_key(&location);

            if chain.contains(&key) {
                let mut cycle = chain.clone();
                cycle.push(key);
                return Err(ConfigError::CyclicExtends { chain: cycle });
            }

            let parent = self
                .loader
                .load(&location)?
                .ok_or_else(|| ConfigError::NotFound(location.display()))?;
            debug!("Merging EXTENDS item {}", item);

            merged.extend(parent.mapping.clone());
            provenance.push(format!("- extends from: {}", item));

            if parent.mapping.contains_key(EXTENDS_KEY) {
                chain.push(key);
                let (deeper, nested) = self.expand(&parent.mapping, merged, chain)?;
                chain.pop();

                merged = deeper;
                provenance.extend(nested);
            }
        }

        merged.extend(document.clone());
        Ok((merged, provenance))
    }
}

/// Lists the `EXTENDS` items of `document` in declared order.
pub fn extends_items(document: &ConfigMapping) -> Result<Vec<String>, ConfigError> {
    match document.get(EXTENDS_KEY) {
        None | Some(ConfigValue::Null) => Ok(Vec::new()),
        Some(ConfigValue::String(s)) => Ok(s
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()),
        Some(ConfigValue::List(items)) => items
            .iter()
            .map(|item| match item {
                ConfigValue::String(s) => Ok(s.trim().to_string()),
                other => Err(ConfigError::parse(
                    EXTENDS_KEY,
                    format!("EXTENDS items must be strings, found {}", other),
                )),
            })
            .collect(),
        Some(other) => Err(ConfigError::parse(
            EXTENDS_KEY,
            format!("EXTENDS must be a string or a list, found {}", other),
        )),
    }
}

/// Identity of a location within one chain. Local paths are canonicalized
/// so `a.yml` and `./a.yml` compare equal.
fn chain_key(location: &ConfigLocation) -> String {
    match location {
        ConfigLocation::Local(path) => canonical(path).display().to_string(),
        ConfigLocation::Remote(url) => url.clone(),
    }
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
