//! Secured variables and environment materialization.

use std::collections::BTreeMap;

use crate::store::ConfigStore;
use crate::{ConfigError, ConfigValue, RequestId};

/// Replacement value for secured variables.
pub const REDACTION_MARKER: &str = "HIDDEN_BY_MEGALINTER";

/// Key replacing the built-in secured list.
pub const SECURED_DEFAULT_KEY: &str = "SECURED_ENV_VARIABLES_DEFAULT";

/// Key adding names to the secured list.
pub const SECURED_EXTRA_KEY: &str = "SECURED_ENV_VARIABLES";

/// Names redacted unless `SECURED_ENV_VARIABLES_DEFAULT` says otherwise.
pub const DEFAULT_SECURED_VARIABLES: [&str; 15] = [
    "GITHUB_TOKEN",
    "PAT",
    "SYSTEM_ACCESSTOKEN",
    "GIT_AUTHORIZATION_BEARER",
    "CI_JOB_TOKEN",
    "GITLAB_ACCESS_TOKEN_MEGALINTER",
    "GITLAB_CUSTOM_CERTIFICATE",
    "WEBHOOK_REPORTER_BEARER_TOKEN",
    "NPM_TOKEN",
    "DOCKER_USERNAME",
    "DOCKER_PASSWORD",
    "CODECOV_TOKEN",
    "GCR_USERNAME",
    "GCR_PASSWORD",
    "SMTP_PASSWORD",
];

impl ConfigStore {
    /// Effective secured variable names for `id`.
    pub fn secured_variables(&self, id: &RequestId) -> Result<Vec<String>, ConfigError> {
        let defaults = DEFAULT_SECURED_VARIABLES
            .iter()
            .map(|name| ConfigValue::from(*name))
            .collect();

        let mut names = self.get_list_or(id, SECURED_DEFAULT_KEY, defaults)?;
        names.extend(self.get_list_or(id, SECURED_EXTRA_KEY, Vec::new())?);

        Ok(names.iter().map(ConfigValue::to_env_string).collect())
    }

    /// Flat string view of the configuration, suitable as a subprocess
    /// environment. With `redact`, secured variables carry
    /// [`REDACTION_MARKER`] instead of their value.
    pub fn materialize_environment(
        &self,
        id: &RequestId,
        redact: bool,
    ) -> Result<BTreeMap<String, String>, ConfigError> {
        let secured = if redact {
            self.secured_variables(id)?
        } else {
            Vec::new()
        };

        self.with_run(id, |run| {
            run.mapping
                .iter()
                .map(|(key, value)| {
                    let value = if secured.contains(key) {
                        REDACTION_MARKER.to_string()
                    } else {
                        value.to_env_string()
                    };
                    (key.clone(), value)
                })
                .collect()
        })
    }
}
