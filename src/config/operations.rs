//! Config loading, environment overrides, validation, and accessors.

use super::model::Config;
use super::types::{AgentSettings, env_keys};
use crate::error::{BridgeError, Result};
use crate::model::AgentId;
use std::path::{Path, PathBuf};
use std::time::Duration;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown top-level fields in the YAML are silently ignored for forward
    /// compatibility.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the config YAML file
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(BridgeError::Configuration)` - Read error, parse error, or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::configuration(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| BridgeError::configuration(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            BridgeError::configuration(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Build the effective configuration for this process.
    ///
    /// Precedence, lowest to highest: built-in defaults, the YAML file
    /// (`explicit` or `NEXUS_CONFIG`), then `NEXUS_*` environment overrides.
    /// A config file that was asked for but cannot be read is an error.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit.map(Path::to_path_buf).or_else(|| {
            std::env::var_os(env_keys::CONFIG)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        });

        let mut config = match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config file");
                Self::load(path)?
            }
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `NEXUS_*` overrides read through `lookup`.
    ///
    /// Empty values are treated as unset. A numeric override that does not
    /// parse is a configuration error naming the variable and its value.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(raw) = lookup(env_keys::TIMEOUT_SECONDS) {
            self.timeout_seconds = parse_positive(env_keys::TIMEOUT_SECONDS, &raw)?;
        }
        if let Some(raw) = lookup(env_keys::OUTPUT_LIMIT_BYTES) {
            self.output_limit_bytes = parse_positive(env_keys::OUTPUT_LIMIT_BYTES, &raw)?;
        }
        if let Some(raw) = lookup(env_keys::MAX_CONCURRENCY) {
            self.max_concurrency = parse_positive(env_keys::MAX_CONCURRENCY, &raw)?;
        }
        if let Some(raw) = lookup(env_keys::EVENT_LOG) {
            self.event_log = Some(PathBuf::from(raw));
        }

        for id in AgentId::ALL {
            let prefix = id.env_prefix();
            let path = lookup(&env_keys::agent_path(&prefix));
            let model = lookup(&env_keys::agent_model(&prefix));
            if path.is_none() && model.is_none() {
                continue;
            }

            let settings = self.agents.entry(id).or_default();
            if let Some(path) = path {
                settings.binary = Some(path);
            }
            if let Some(model) = model {
                settings.model = Some(model);
            }
        }

        Ok(())
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `timeout_seconds`, `output_limit_bytes` and `max_concurrency` must be positive
    /// - agent `binary` and `model`, when set, must be non-empty
    pub fn validate(&self) -> Result<()> {
        if self.timeout_seconds == 0 {
            return Err(BridgeError::invalid_key(
                "timeout_seconds",
                "config validation failed: timeout_seconds must be greater than 0",
            ));
        }

        if self.output_limit_bytes == 0 {
            return Err(BridgeError::invalid_key(
                "output_limit_bytes",
                "config validation failed: output_limit_bytes must be greater than 0",
            ));
        }

        if self.max_concurrency == 0 {
            return Err(BridgeError::invalid_key(
                "max_concurrency",
                "config validation failed: max_concurrency must be greater than 0",
            ));
        }

        for (id, settings) in &self.agents {
            if settings.binary.as_deref().is_some_and(|b| b.trim().is_empty()) {
                return Err(BridgeError::invalid_key(
                    "binary",
                    format!("config validation failed: agents.{}.binary must not be empty", id),
                )
                .for_agent(*id));
            }
            if settings.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
                return Err(BridgeError::invalid_key(
                    "model",
                    format!("config validation failed: agents.{}.model must not be empty", id),
                )
                .for_agent(*id));
            }
        }

        Ok(())
    }

    /// The invocation timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Settings for `id`, or defaults when the agent is not configured.
    pub fn settings_for(&self, id: AgentId) -> AgentSettings {
        self.agents.get(&id).cloned().unwrap_or_default()
    }
}

fn parse_positive<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr + PartialEq + Default,
{
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => Ok(value),
        _ => Err(BridgeError::invalid_key(
            key,
            format!("invalid value for {}: '{}' is not a positive integer", key, raw),
        )),
    }
}
