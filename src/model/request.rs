//! Invocation requests and typed option access.

use super::AgentId;
use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Raw request options: recognized option name to JSON value.
pub type Options = BTreeMap<String, Value>;

/// Option names understood by at least one runner.
pub mod option_names {
    /// Model to use instead of the CLI's default (string).
    pub const MODEL: &str = "model";
    /// `default`, `sandbox` or `yolo`.
    pub const EXECUTION_MODE: &str = "execution_mode";
    /// File paths appended to the prompt (array of strings).
    pub const FILE_REFS: &str = "file_refs";
    /// Session to resume (string, claude only).
    pub const SESSION_ID: &str = "session_id";
}

/// How much autonomy the agent is granted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// The CLI's safe defaults; no auto-approval.
    #[default]
    Default,
    /// Sandboxed execution where the CLI supports it.
    Sandbox,
    /// Auto-approve every action.
    Yolo,
}

impl ExecutionMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "default" => Some(ExecutionMode::Default),
            "sandbox" => Some(ExecutionMode::Sandbox),
            "yolo" => Some(ExecutionMode::Yolo),
            _ => None,
        }
    }
}

/// A single prompt for a single agent.
///
/// Built once per call and never mutated afterwards. Option values are
/// validated lazily by the chosen runner, not here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationRequest {
    agent: AgentId,
    prompt: String,
    options: Options,
}

impl InvocationRequest {
    /// Create a request with no options.
    ///
    /// Rejects prompts that are empty or whitespace-only.
    pub fn new(agent: AgentId, prompt: impl Into<String>) -> Result<Self> {
        Self::with_options(agent, prompt, Options::new())
    }

    /// Create a request carrying options.
    pub fn with_options(agent: AgentId, prompt: impl Into<String>, options: Options) -> Result<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(
                BridgeError::invalid_key("prompt", "prompt must not be empty").for_agent(agent),
            );
        }
        Ok(Self {
            agent,
            prompt,
            options,
        })
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Read a non-empty string option.
    pub fn string_option(&self, name: &str) -> Result<Option<&str>> {
        match self.options.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Err(self.invalid(
                name,
                format!("option '{}' must not be empty", name),
            )),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(self.invalid(
                name,
                format!(
                    "option '{}' must be a string, got {}",
                    name,
                    json_type_name(other)
                ),
            )),
        }
    }

    /// Read an option holding an array of strings.
    pub fn string_list_option(&self, name: &str) -> Result<Vec<&str>> {
        match self.options.get(name) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().ok_or_else(|| {
                        self.invalid(
                            name,
                            format!(
                                "option '{}' must contain only strings, found {}",
                                name,
                                json_type_name(item)
                            ),
                        )
                    })
                })
                .collect(),
            Some(other) => Err(self.invalid(
                name,
                format!(
                    "option '{}' must be an array of strings, got {}",
                    name,
                    json_type_name(other)
                ),
            )),
        }
    }

    /// The requested execution mode, `Default` when absent.
    pub fn execution_mode(&self) -> Result<ExecutionMode> {
        match self.string_option(option_names::EXECUTION_MODE)? {
            None => Ok(ExecutionMode::Default),
            Some(raw) => ExecutionMode::parse(raw).ok_or_else(|| {
                self.invalid(
                    option_names::EXECUTION_MODE,
                    format!(
                        "option 'execution_mode' must be one of default, sandbox, yolo (got '{}')",
                        raw
                    ),
                )
            }),
        }
    }

    /// The prompt with any `file_refs` appended as a bullet list.
    pub fn prompt_with_file_refs(&self) -> Result<String> {
        let refs = self.string_list_option(option_names::FILE_REFS)?;
        if refs.is_empty() {
            return Ok(self.prompt.clone());
        }
        let list = refs
            .iter()
            .map(|path| format!("- {}", path))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(format!("{}\n\nFile references:\n{}", self.prompt, list))
    }

    fn invalid(&self, key: &str, message: String) -> BridgeError {
        BridgeError::invalid_key(key, message).for_agent(self.agent)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
