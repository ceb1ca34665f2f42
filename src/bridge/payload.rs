//! Caller-facing shapes: batch tasks, batch results and error payloads.

use crate::error::{BridgeError, ErrorKind};
use crate::model::{AgentId, Options, StructuredResult, option_names};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One prompt in a batch.
///
/// The shorthand fields are folded into `options` by
/// [`merged_options`](Self::merged_options) and win over entries of the
/// same name there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTask {
    pub agent: String,
    pub prompt: String,
    #[serde(default)]
    pub options: Options,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_refs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl AgentTask {
    pub fn new(agent: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            prompt: prompt.into(),
            options: Options::new(),
            label: None,
            model: None,
            execution_mode: None,
            file_refs: None,
            session_id: None,
        }
    }

    /// `options` with the shorthand fields applied.
    pub fn merged_options(&self) -> Options {
        let mut options = self.options.clone();
        if let Some(model) = &self.model {
            options.insert(option_names::MODEL.to_string(), Value::from(model.clone()));
        }
        if let Some(mode) = &self.execution_mode {
            options.insert(
                option_names::EXECUTION_MODE.to_string(),
                Value::from(mode.clone()),
            );
        }
        if let Some(refs) = &self.file_refs {
            options.insert(option_names::FILE_REFS.to_string(), Value::from(refs.clone()));
        }
        if let Some(session) = &self.session_id {
            options.insert(
                option_names::SESSION_ID.to_string(),
                Value::from(session.clone()),
            );
        }
        options
    }
}

/// Serializable form of a [`BridgeError`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Offending option or setting for configuration errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl From<&BridgeError> for ToolError {
    fn from(err: &BridgeError) -> Self {
        let mut payload = ToolError {
            kind: err.kind(),
            message: err.to_string(),
            agent: err.agent(),
            exit_code: None,
            stderr: None,
            timeout_seconds: None,
            partial_output: None,
            command: err.command().map(str::to_string),
            key: None,
        };

        match err {
            BridgeError::Configuration { key, .. } => payload.key = key.clone(),
            BridgeError::AgentExecution {
                exit_code, stderr, ..
            } => {
                payload.exit_code = Some(*exit_code);
                payload.stderr = non_empty(stderr);
            }
            BridgeError::Timeout {
                timeout,
                partial_stdout,
                partial_stderr,
                ..
            } => {
                payload.timeout_seconds = Some(timeout.as_secs_f64());
                payload.partial_output = non_empty(partial_stdout);
                payload.stderr = non_empty(partial_stderr);
            }
            BridgeError::UnknownAgent { .. }
            | BridgeError::AgentNotFound { .. }
            | BridgeError::Cancelled { .. } => {}
        }

        payload
    }
}

impl From<BridgeError> for ToolError {
    fn from(err: BridgeError) -> Self {
        ToolError::from(&err)
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// How one batch task ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskOutcome {
    Result(StructuredResult),
    Error(ToolError),
}

/// Result of one batch task, tagged with its label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub label: String,
    pub agent: String,
    #[serde(flatten)]
    pub outcome: TaskOutcome,
}

impl TaskResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Result(_))
    }
}

/// Results of a batch, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub results: Vec<TaskResult>,
}

impl BatchResponse {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}
