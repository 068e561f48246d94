//! Typed read/write access to a request's configuration.

use crate::store::ConfigStore;
use crate::{ConfigError, ConfigValue, RequestId};

impl ConfigStore {
    /// Value of `key`, with booleans normalized to `"true"` / `"false"`.
    pub fn get(&self, id: &RequestId, key: &str) -> Result<Option<ConfigValue>, ConfigError> {
        self.with_run(id, |run| run.mapping.get(key).cloned().map(ConfigValue::normalized))
    }

    /// Value of `key`, or `default` when absent.
    pub fn get_or(
        &self,
        id: &RequestId,
        key: &str,
        default: impl Into<ConfigValue>,
    ) -> Result<ConfigValue, ConfigError> {
        Ok(self.get(id, key)?.unwrap_or_else(|| default.into()))
    }

    /// Environment-style string form of `key`.
    pub fn get_str(&self, id: &RequestId, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.get(id, key)?.map(|value| value.to_env_string()))
    }

    /// List value of `key`.
    ///
    /// Native lists are returned as-is, an empty string is an empty list, a
    /// string starting with `[` is parsed as a JSON array, anything else is
    /// split on commas. A null value counts as absent.
    pub fn get_list(
        &self,
        id: &RequestId,
        key: &str,
    ) -> Result<Option<Vec<ConfigValue>>, ConfigError> {
        match self.get(id, key)? {
            None | Some(ConfigValue::Null) => Ok(None),
            Some(value) => parse_list(key, value).map(Some),
        }
    }

    /// List value of `key`, or `default` when absent.
    pub fn get_list_or(
        &self,
        id: &RequestId,
        key: &str,
        default: Vec<ConfigValue>,
    ) -> Result<Vec<ConfigValue>, ConfigError> {
        Ok(self.get_list(id, key)?.unwrap_or(default))
    }

    /// Argument vector stored under `key`, split with shell quoting rules.
    pub fn get_list_args(
        &self,
        id: &RequestId,
        key: &str,
    ) -> Result<Option<Vec<String>>, ConfigError> {
        match self.get(id, key)? {
            None | Some(ConfigValue::Null) => Ok(None),
            Some(ConfigValue::List(items)) => {
                Ok(Some(items.iter().map(ConfigValue::to_env_string).collect()))
            }
            Some(ConfigValue::Map(_)) => Err(ConfigError::malformed_list(
                key,
                "a mapping cannot be used as an argument list",
            )),
            Some(value) => {
                let raw = value.to_env_string();
                if raw.is_empty() {
                    return Ok(Some(Vec::new()));
                }
                shlex::split(&raw)
                    .map(Some)
                    .ok_or_else(|| ConfigError::malformed_list(key, "unbalanced quoting"))
            }
        }
    }

    /// Sets `key` on an initialized request.
    pub fn set_value(
        &self,
        id: &RequestId,
        key: impl Into<String>,
        value: impl Into<ConfigValue>,
    ) -> Result<(), ConfigError> {
        let key = key.into();
        let value = value.into();
        self.with_run_mut(id, move |run| {
            run.mapping.insert(key, value);
        })
    }

    /// Returns true if `key` is present.
    pub fn exists(&self, id: &RequestId, key: &str) -> Result<bool, ConfigError> {
        self.with_run(id, |run| run.mapping.contains_key(key))
    }

    /// Removes `key`. Removing an absent key is a no-op.
    pub fn remove_key(&self, id: &RequestId, key: &str) -> Result<(), ConfigError> {
        self.with_run_mut(id, |run| {
            run.mapping.remove(key);
        })
    }
}

fn parse_list(key: &str, value: ConfigValue) -> Result<Vec<ConfigValue>, ConfigError> {
    match value {
        ConfigValue::List(items) => Ok(items),
        ConfigValue::Map(_) => Err(ConfigError::malformed_list(
            key,
            "a mapping cannot be read as a list",
        )),
        ConfigValue::String(s) if s.is_empty() => Ok(Vec::new()),
        ConfigValue::String(s) if s.starts_with('[') => {
            let parsed: serde_json::Value = serde_json::from_str(&s)
                .map_err(|e| ConfigError::malformed_list(key, e.to_string()))?;
            match ConfigValue::from(parsed) {
                ConfigValue::List(items) => Ok(items),
                _ => Err(ConfigError::malformed_list(key, "expected a JSON array")),
            }
        }
        other => Ok(other
            .to_env_string()
            .split(',')
            .map(ConfigValue::from)
            .collect()),
    }
}
