//! Configuration types and defaults.
//!
//! This module defines per-agent settings, the environment variable names
//! that override file values, and default value functions used by the
//! `Config` struct.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Environment variables read by `Config::apply_env_overrides`.
pub mod env_keys {
    /// Path of the YAML config file when `--config` is not given.
    pub const CONFIG: &str = "NEXUS_CONFIG";
    pub const TIMEOUT_SECONDS: &str = "NEXUS_TIMEOUT_SECONDS";
    pub const OUTPUT_LIMIT_BYTES: &str = "NEXUS_OUTPUT_LIMIT_BYTES";
    pub const MAX_CONCURRENCY: &str = "NEXUS_MAX_CONCURRENCY";
    pub const EVENT_LOG: &str = "NEXUS_EVENT_LOG";

    /// `NEXUS_{AGENT}_PATH`, overriding the agent's executable.
    pub fn agent_path(prefix: &str) -> String {
        format!("NEXUS_{}_PATH", prefix)
    }

    /// `NEXUS_{AGENT}_MODEL`, overriding the agent's default model.
    pub fn agent_model(prefix: &str) -> String {
        format!("NEXUS_{}_MODEL", prefix)
    }
}

/// Settings for one agent, keyed by agent name under `agents:`.
///
/// ```yaml
/// agents:
///   gemini:
///     binary: /opt/gemini/bin/gemini
///     model: gemini-2.5-flash
///     environment:
///       GEMINI_API_KEY: "..."
///     extra_args: ["--debug"]
///     json_output: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Executable to run instead of the agent's default binary name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,

    /// Model used when the request does not name one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Extra environment variables for the subprocess.
    pub environment: BTreeMap<String, String>,

    /// Arguments inserted verbatim before the prompt delivery.
    pub extra_args: Vec<String>,

    /// Ask the agent for JSON output (gemini only). Unset means "if the
    /// installed CLI version supports it".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_output: Option<bool>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            binary: None,
            model: None,
            environment: BTreeMap::new(),
            extra_args: Vec::new(),
            json_output: None,
        }
    }
}

impl AgentSettings {
    /// The executable to spawn: the configured binary or `default_binary`.
    pub fn program<'a>(&'a self, default_binary: &'a str) -> &'a str {
        self.binary.as_deref().unwrap_or(default_binary)
    }
}

pub(crate) fn default_timeout_seconds() -> u64 {
    600
}

pub(crate) fn default_output_limit_bytes() -> usize {
    50_000
}

pub(crate) fn default_max_concurrency() -> usize {
    3
}
