//! Error types for the nexus bridge.
//!
//! Uses thiserror for derive macros. Every failure that crosses the
//! tool-facing boundary is exactly one `BridgeError` variant, and each
//! variant carries the context a caller needs to diagnose it without
//! reading logs (agent, redacted command, exit code, timeout, stderr).

use crate::exit_codes;
use crate::model::AgentId;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Maximum number of stderr characters echoed in an error message.
const STDERR_MESSAGE_CHARS: usize = 500;

/// Classification of a `BridgeError`, serialized into caller-visible payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownAgent,
    Configuration,
    AgentNotFound,
    Timeout,
    AgentExecution,
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::UnknownAgent => write!(f, "unknown_agent"),
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::AgentNotFound => write!(f, "agent_not_found"),
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::AgentExecution => write!(f, "agent_execution"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Main error type for bridge operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The requested agent identifier is not registered.
    #[error("unknown agent '{name}'. Available agents: {}", .available.join(", "))]
    UnknownAgent {
        name: String,
        available: Vec<String>,
    },

    /// Unsupported option, malformed request, or invalid process configuration.
    #[error("{message}")]
    Configuration {
        message: String,
        agent: Option<AgentId>,
        /// Offending option name or configuration key, when there is one.
        key: Option<String>,
    },

    /// The agent executable could not be located or started.
    #[error("{agent} CLI '{program}' could not be started: {source}\nFix: install it or point NEXUS_{}_PATH at it.", .agent.env_prefix())]
    AgentNotFound {
        agent: AgentId,
        program: String,
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The agent did not complete within the bound and was killed.
    #[error("{agent} timed out after {}s and was terminated", .timeout.as_secs_f64())]
    Timeout {
        agent: AgentId,
        timeout: Duration,
        command: String,
        partial_stdout: String,
        partial_stderr: String,
    },

    /// The agent completed but exited non-zero.
    #[error("{agent} exited with code {exit_code}{}", failure_suffix(.detail, .stderr))]
    AgentExecution {
        agent: AgentId,
        exit_code: i32,
        stderr: String,
        command: String,
        /// Agent-specific diagnosis extracted from the output, if any.
        detail: Option<String>,
    },

    /// The invocation was cancelled by the caller and the agent was killed.
    #[error("{agent} invocation was cancelled")]
    Cancelled { agent: AgentId, command: String },
}

fn failure_suffix(detail: &Option<String>, stderr: &str) -> String {
    if let Some(detail) = detail {
        return format!(": {}", detail);
    }
    let stderr = stderr.trim();
    if stderr.is_empty() {
        return String::new();
    }
    if stderr.chars().count() > STDERR_MESSAGE_CHARS {
        let head: String = stderr.chars().take(STDERR_MESSAGE_CHARS).collect();
        format!(": {}...", head)
    } else {
        format!(": {}", stderr)
    }
}

impl BridgeError {
    /// Build a configuration error without agent or key context.
    pub fn configuration(message: impl Into<String>) -> Self {
        BridgeError::Configuration {
            message: message.into(),
            agent: None,
            key: None,
        }
    }

    /// Build a configuration error about a specific option or config key.
    pub fn invalid_key(key: impl Into<String>, message: impl Into<String>) -> Self {
        BridgeError::Configuration {
            message: message.into(),
            agent: None,
            key: Some(key.into()),
        }
    }

    /// Attach agent context to a configuration error; other variants already carry it.
    pub fn for_agent(self, id: AgentId) -> Self {
        match self {
            BridgeError::Configuration { message, key, .. } => BridgeError::Configuration {
                message,
                agent: Some(id),
                key,
            },
            other => other,
        }
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::UnknownAgent { .. } => ErrorKind::UnknownAgent,
            BridgeError::Configuration { .. } => ErrorKind::Configuration,
            BridgeError::AgentNotFound { .. } => ErrorKind::AgentNotFound,
            BridgeError::Timeout { .. } => ErrorKind::Timeout,
            BridgeError::AgentExecution { .. } => ErrorKind::AgentExecution,
            BridgeError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Configuration => exit_codes::CONFIGURATION_ERROR,
            ErrorKind::UnknownAgent => exit_codes::UNKNOWN_AGENT,
            ErrorKind::AgentNotFound => exit_codes::AGENT_NOT_FOUND,
            ErrorKind::AgentExecution => exit_codes::AGENT_EXECUTION_FAILURE,
            ErrorKind::Timeout => exit_codes::TIMEOUT,
            ErrorKind::Cancelled => exit_codes::CANCELLED,
        }
    }

    /// The agent this error concerns, if known.
    pub fn agent(&self) -> Option<AgentId> {
        match self {
            BridgeError::UnknownAgent { .. } => None,
            BridgeError::Configuration { agent, .. } => *agent,
            BridgeError::AgentNotFound { agent, .. }
            | BridgeError::Timeout { agent, .. }
            | BridgeError::AgentExecution { agent, .. }
            | BridgeError::Cancelled { agent, .. } => Some(*agent),
        }
    }

    /// The redacted command line, for errors raised after a command was built.
    pub fn command(&self) -> Option<&str> {
        match self {
            BridgeError::AgentNotFound { command, .. }
            | BridgeError::Timeout { command, .. }
            | BridgeError::AgentExecution { command, .. }
            | BridgeError::Cancelled { command, .. } => Some(command),
            BridgeError::UnknownAgent { .. } | BridgeError::Configuration { .. } => None,
        }
    }
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
