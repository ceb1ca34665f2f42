//! Tool definitions and `tools/call` dispatch.

use crate::agent::CancelToken;
use crate::bridge::{AgentTask, Bridge, CallOptions, ToolError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;

pub const PROMPT: &str = "prompt";
pub const BATCH_PROMPT: &str = "batch_prompt";
pub const LIST_AGENTS: &str = "list_agents";

#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Why a `tools/call` could not be dispatched at all.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToolCallError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },
}

#[derive(Debug, Deserialize)]
struct PromptArgs {
    #[serde(flatten)]
    task: AgentTask,
    #[serde(default)]
    timeout_seconds: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct BatchArgs {
    tasks: Vec<AgentTask>,
    #[serde(default)]
    max_concurrency: Option<usize>,
}

fn task_properties() -> Value {
    json!({
        "agent": {"type": "string", "description": "Agent name: gemini, codex or claude"},
        "prompt": {"type": "string"},
        "options": {"type": "object", "description": "Agent-specific options"},
        "model": {"type": "string"},
        "execution_mode": {"type": "string", "enum": ["default", "sandbox", "yolo"]},
        "file_refs": {"type": "array", "items": {"type": "string"}},
        "session_id": {"type": "string", "description": "Resume a session (claude only)"},
    })
}

pub fn definitions() -> Vec<ToolDefinition> {
    let mut prompt_properties = task_properties();
    prompt_properties["timeout_seconds"] = json!({"type": "number", "exclusiveMinimum": 0});

    let mut batch_task = task_properties();
    batch_task["label"] = json!({"type": "string"});

    vec![
        ToolDefinition {
            name: PROMPT,
            description: "Send a prompt to a coding agent CLI and return its answer.",
            input_schema: json!({
                "type": "object",
                "properties": prompt_properties,
                "required": ["agent", "prompt"],
            }),
        },
        ToolDefinition {
            name: BATCH_PROMPT,
            description: "Run several independent prompts concurrently; results keep input order.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "tasks": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": batch_task,
                            "required": ["agent", "prompt"],
                        },
                    },
                    "max_concurrency": {"type": "integer", "minimum": 1},
                },
                "required": ["tasks"],
            }),
        },
        ToolDefinition {
            name: LIST_AGENTS,
            description: "List the agent names this server can run.",
            input_schema: json!({"type": "object", "properties": {}}),
        },
    ]
}

fn parse_args<T: serde::de::DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolCallError> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| ToolCallError::InvalidArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

fn tool_result<T: Serialize>(payload: &T, is_error: bool) -> Value {
    let structured = serde_json::to_value(payload).unwrap_or(Value::Null);
    let text = serde_json::to_string_pretty(&structured).unwrap_or_default();
    json!({
        "content": [{"type": "text", "text": text}],
        "structuredContent": structured,
        "isError": is_error,
    })
}

/// Run one tool and build its `tools/call` result.
///
/// Bridge failures are tool results with `isError: true`; only an unknown
/// tool or malformed arguments produce an `Err`.
pub fn call(
    bridge: &Bridge,
    name: &str,
    arguments: Value,
    cancel: &CancelToken,
) -> Result<Value, ToolCallError> {
    match name {
        PROMPT => {
            let args: PromptArgs = parse_args(name, arguments)?;
            let timeout = match args.timeout_seconds {
                Some(secs) if !secs.is_finite() || secs <= 0.0 => {
                    return Err(ToolCallError::InvalidArguments {
                        tool: name.to_string(),
                        message: "timeout_seconds must be greater than 0".to_string(),
                    });
                }
                Some(secs) => match Duration::try_from_secs_f64(secs) {
                Ok(timeout) => Some(timeout),
                Err(e) => {
                    return Err(ToolCallError::InvalidArguments {
                        tool: name.to_string(),
                        message: format!("timeout_seconds is out of range: {}", e),
                    });
                }
            },
                None => None,
            };
            let call = CallOptions {
                timeout,
                cancel: cancel.clone(),
                label: args.task.label.clone(),
            };
            let task = &args.task;
            Ok(
                match bridge.invoke_with(&task.agent, &task.prompt, task.merged_options(), &call) {
                    Ok(result) => tool_result(&result, false),
                    Err(e) => tool_result(&ToolError::from(&e), true),
                },
            )
        }
        BATCH_PROMPT => {
            let args: BatchArgs = parse_args(name, arguments)?;
            if args.max_concurrency == Some(0) {
                return Err(ToolCallError::InvalidArguments {
                    tool: name.to_string(),
                    message: "max_concurrency must be at least 1".to_string(),
                });
            }
            let response = bridge.batch(&args.tasks, args.max_concurrency, cancel);
            Ok(tool_result(&response, false))
        }
        LIST_AGENTS => Ok(tool_result(&json!({"agents": bridge.list_agents()}), false)),
        other => Err(ToolCallError::UnknownTool(other.to_string())),
    }
}
