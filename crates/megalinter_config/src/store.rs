//! Request-scoped configuration store.
//!
//! Each [`RequestId`] owns one guarded slot. The map of slots is only locked
//! long enough to find or insert a slot; resolution of one request holds its
//! slot lock, so unrelated requests never wait on each other.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::{ConfigError, ConfigMapping, ConfigValue, RequestId};

/// Where environment variables are read from.
#[derive(Debug, Clone, Default)]
pub enum Environment {
    /// The live process environment, snapshotted on every read.
    #[default]
    Process,
    /// A fixed set of variables.
    Fixed(ConfigMapping),
}

impl Environment {
    pub fn process() -> Self {
        Self::Process
    }

    /// A fixed environment built from `(name, value)` pairs.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Fixed(
            vars.into_iter()
                .map(|(k, v)| (k.into(), ConfigValue::String(v.into())))
                .collect(),
        )
    }

    /// Current variables as string values. Non-UTF-8 process variables are
    /// skipped.
    pub fn snapshot(&self) -> ConfigMapping {
        match self {
            Self::Process => std::env::vars_os()
                .filter_map(|(k, v)| {
                    let key = k.into_string().ok()?;
                    let value = v.into_string().ok()?;
                    Some((key, ConfigValue::String(value)))
                })
                .collect(),
            Self::Fixed(vars) => vars.clone(),
        }
    }
}

/// Resolved configuration of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub mapping: ConfigMapping,
    /// Provenance trail, one source per line. Never parsed back.
    pub source_description: String,
}

pub(crate) type Slot = Arc<Mutex<Option<RunConfig>>>;

/// Registry of resolved configurations keyed by request.
#[derive(Debug, Default)]
pub struct ConfigStore {
    runs: RwLock<HashMap<RequestId, Slot>>,
    environment: Environment,
}

impl ConfigStore {
    /// Creates an empty store reading the process environment.
    pub fn new() -> Self {
        Self::with_environment(Environment::process())
    }

    /// Creates an empty store reading variables from `environment`.
    pub fn with_environment(environment: Environment) -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
            environment,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Returns true once `id` has a resolved configuration.
    pub fn is_initialized(&self, id: &RequestId) -> bool {
        self.existing(id)
            .map(|slot| slot.lock().is_some())
            .unwrap_or(false)
    }

    /// Owned copy of the mapping resolved for `id`.
    pub fn get_config(&self, id: &RequestId) -> Result<ConfigMapping, ConfigError> {
        self.with_run(id, |run| run.mapping.clone())
    }

    /// Mapping and provenance resolved for `id`.
    pub fn run_config(&self, id: &RequestId) -> Result<RunConfig, ConfigError> {
        self.with_run(id, RunConfig::clone)
    }

    pub fn source_description(&self, id: &RequestId) -> Result<String, ConfigError> {
        self.with_run(id, |run| run.source_description.clone())
    }

    /// Environment view for callers running outside any request.
    pub fn get_global(&self) -> ConfigMapping {
        self.environment.snapshot()
    }

    /// Replaces the whole mapping of `id`, creating the entry if needed.
    pub fn set_config(&self, id: &RequestId, mapping: ConfigMapping) {
        self.with_slot(id, |run| match run.as_mut() {
            Some(run) => run.mapping = mapping,
            None => {
                *run = Some(RunConfig {
                    mapping,
                    source_description: String::new(),
                })
            }
        });
    }

    /// Removes the entry of `id`.
    pub fn delete(&self, id: &RequestId) {
        if self.runs.write().remove(id).is_some() {
            debug!("Cleared runtime config for request {}", id);
        }
    }

    /// Clears every entry. Meant for test isolation.
    pub fn delete_all(&self) {
        self.runs.write().clear();
    }

    pub(crate) fn with_run<R>(
        &self,
        id: &RequestId,
        f: impl FnOnce(&RunConfig) -> R,
    ) -> Result<R, ConfigError> {
        let slot = self
            .existing(id)
            .ok_or_else(|| ConfigError::NotInitialized(id.clone()))?;
        let guard = slot.lock();
        guard
            .as_ref()
            .map(f)
            .ok_or_else(|| ConfigError::NotInitialized(id.clone()))
    }

    pub(crate) fn with_run_mut<R>(
        &self,
        id: &RequestId,
        f: impl FnOnce(&mut RunConfig) -> R,
    ) -> Result<R, ConfigError> {
        let slot = self
            .existing(id)
            .ok_or_else(|| ConfigError::NotInitialized(id.clone()))?;
        let mut guard = slot.lock();
        guard
            .as_mut()
            .map(f)
            .ok_or_else(|| ConfigError::NotInitialized(id.clone()))
    }

    /// Runs `f` with the locked slot of `id`, inserting the slot if missing.
    ///
    /// A slot left empty by `f` is unregistered before its lock is released,
    /// so callers queued on it retry with a fresh slot. Lock order is always
    /// slot then map; the map is never held while waiting on a slot.
    pub(crate) fn with_slot<R>(
        &self,
        id: &RequestId,
        f: impl FnOnce(&mut Option<RunConfig>) -> R,
    ) -> R {
        loop {
            let slot = self.slot(id);
            let mut guard = slot.lock();
            if !self.is_registered(id, &slot) {
                continue;
            }

            let result = f(&mut *guard);
            if guard.is_none() {
                self.unregister(id, &slot);
            }
            return result;
        }
    }

    fn slot(&self, id: &RequestId) -> Slot {
        if let Some(slot) = self.existing(id) {
            return slot;
        }
        self.runs.write().entry(id.clone()).or_default().clone()
    }

    fn is_registered(&self, id: &RequestId, slot: &Slot) -> bool {
        self.runs
            .read()
            .get(id)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
    }

    fn unregister(&self, id: &RequestId, slot: &Slot) {
        let mut runs = self.runs.write();
        if runs.get(id).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            runs.remove(id);
        }
    }

    fn existing(&self, id: &RequestId) -> Option<Slot> {
        self.runs.read().get(id).cloned()
    }
}
