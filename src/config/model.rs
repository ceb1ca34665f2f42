//! Config struct definition and default implementation.

use super::types::*;
use crate::model::AgentId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Configuration for the bridge.
///
/// Unknown top-level fields in the YAML are ignored for forward
/// compatibility. Keys under `agents` must name a registered agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Execution settings
    // =========================================================================
    /// Upper bound on one agent invocation, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Content and raw output longer than this are truncated.
    #[serde(default = "default_output_limit_bytes")]
    pub output_limit_bytes: usize,

    /// Default worker count for batch invocations.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    // =========================================================================
    // Audit settings
    // =========================================================================
    /// NDJSON file receiving invocation events (disabled when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_log: Option<PathBuf>,

    // =========================================================================
    // Agent settings
    // =========================================================================
    #[serde(default)]
    pub agents: BTreeMap<AgentId, AgentSettings>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            output_limit_bytes: default_output_limit_bytes(),
            max_concurrency: default_max_concurrency(),
            event_log: None,
            agents: BTreeMap::new(),
        }
    }
}
