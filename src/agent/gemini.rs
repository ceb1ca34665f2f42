//! Google Gemini CLI runner.
//!
//! ```text
//! gemini [extra_args] --prompt=<prompt> [--output-format json] [--model M] [--sandbox|--yolo]
//! ```
//!
//! The CLI answers with `{"response": "...", "stats": {...}}`. On failure it
//! tends to print a Google API error object, either on stdout or at the end
//! of stderr after log lines and a stack trace.

use crate::agent::command::AgentCommand;
use crate::agent::runner::Runner;
use crate::config::AgentSettings;
use crate::error::Result;
use crate::model::{AgentId, ExecutionMode, InvocationRequest, ProcessOutcome, option_names};
use crate::parser::{extract_last_json_array, extract_last_json_object};
use serde_json::{Map, Value};

pub const DEFAULT_BINARY: &str = "gemini";

const SUPPORTED_OPTIONS: [&str; 3] = [
    option_names::MODEL,
    option_names::EXECUTION_MODE,
    option_names::FILE_REFS,
];

#[derive(Debug, Clone, Default)]
pub struct GeminiRunner {
    settings: AgentSettings,
}

impl GeminiRunner {
    pub fn new(settings: AgentSettings) -> Self {
        Self { settings }
    }
}

impl Runner for GeminiRunner {
    fn agent(&self) -> AgentId {
        AgentId::Gemini
    }

    fn build_command(&self, request: &InvocationRequest) -> Result<AgentCommand> {
        let prompt = request.prompt_with_file_refs()?;
        let mut command = AgentCommand::new(self.settings.program(DEFAULT_BINARY))
            .args(self.settings.extra_args.iter().cloned())
            .prompt_flag("--prompt", &prompt);

        if self.settings.json_output.unwrap_or(true) {
            command = command.args(["--output-format", "json"]);
        }

        // Request model beats configured default beats CLI default
        let model = request
            .string_option(option_names::MODEL)?
            .or(self.settings.model.as_deref());
        if let Some(model) = model {
            command = command.args(["--model", model]);
        }

        command = match request.execution_mode()? {
            ExecutionMode::Default => command,
            ExecutionMode::Sandbox => command.arg("--sandbox"),
            ExecutionMode::Yolo => command.arg("--yolo"),
        };

        Ok(command.envs(&self.settings.environment))
    }

    fn supports(&self, option: &str) -> bool {
        SUPPORTED_OPTIONS.contains(&option)
    }

    fn describe_failure(&self, outcome: &ProcessOutcome) -> Option<String> {
        api_error_detail(&outcome.stdout, &outcome.stderr)
    }
}

/// Summarize a Gemini API error object found in the output, if any.
///
/// stdout is only considered when it is a JSON object as a whole; stderr is
/// searched for its last JSON array, then its last JSON object.
fn api_error_detail(stdout: &str, stderr: &str) -> Option<String> {
    let from_stdout = match serde_json::from_str::<Value>(stdout.trim()) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    };

    let data = from_stdout
        .or_else(|| extract_last_json_array(stderr))
        .or_else(|| extract_last_json_object(stderr))?;

    describe_api_error(&data)
}

fn describe_api_error(data: &Map<String, Value>) -> Option<String> {
    let error = data.get("error")?.as_object()?;

    let code = match error.get("code") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => "unknown".to_string(),
    };
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    let status = error.get("status").and_then(Value::as_str).unwrap_or("");

    // The CLI's own wrapper error carries no information
    if code == "1" && message == "[object Object]" {
        return None;
    }

    Some(format!("Gemini API error {}: {} ({})", code, message, status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Options;
    use crate::test_support::outcome;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn request(prompt: &str, options: serde_json::Value) -> InvocationRequest {
        let options: Options = serde_json::from_value(options).unwrap();
        InvocationRequest::with_options(AgentId::Gemini, prompt, options).unwrap()
    }

    #[test]
    fn test_build_command_basic() {
        let runner = GeminiRunner::default();
        let command = runner.build_command(&request("hello", json!({}))).unwrap();

        assert_eq!(
            command.argv(),
            &["gemini", "--prompt=hello", "--output-format", "json"]
        );
        assert!(command.stdin().is_none());
    }

    #[test]
    fn test_build_command_with_model_mode_and_file_refs() {
        let runner = GeminiRunner::default();
        let command = runner
            .build_command(&request(
                "review",
                json!({"model": "gemini-2.5-pro", "execution_mode": "yolo", "file_refs": ["src/main.rs"]}),
            ))
            .unwrap();

        assert_eq!(
            command.argv(),
            &[
                "gemini",
                "--prompt=review\n\nFile references:\n- src/main.rs",
                "--output-format",
                "json",
                "--model",
                "gemini-2.5-pro",
                "--yolo",
            ]
        );
    }

    #[test]
    fn test_settings_supply_binary_model_and_env() {
        let mut environment = BTreeMap::new();
        environment.insert("GEMINI_API_KEY".to_string(), "k".to_string());
        let runner = GeminiRunner::new(AgentSettings {
            binary: Some("/opt/bin/gemini".to_string()),
            model: Some("flash".to_string()),
            environment,
            extra_args: vec!["--debug".to_string()],
            json_output: Some(false),
        });

        let command = runner
            .build_command(&request("hi", json!({"execution_mode": "sandbox"})))
            .unwrap();
        assert_eq!(
            command.argv(),
            &["/opt/bin/gemini", "--debug", "--prompt=hi", "--model", "flash", "--sandbox"]
        );
        assert_eq!(command.env()["GEMINI_API_KEY"], "k");

        // Request model wins over the configured default
        let command = runner
            .build_command(&request("hi", json!({"model": "pro"})))
            .unwrap();
        assert!(command.argv().windows(2).any(|w| w == ["--model", "pro"]));
    }

    #[test]
    fn test_supported_options() {
        let runner = GeminiRunner::default();
        assert!(runner.supports("model"));
        assert!(runner.supports("execution_mode"));
        assert!(runner.supports("file_refs"));
        assert!(!runner.supports("session_id"));
        assert!(!runner.supports("temperature"));
    }

    #[test]
    fn test_describe_failure_from_stdout_error_object() {
        let runner = GeminiRunner::default();
        let detail = runner.describe_failure(&outcome(
            1,
            r#"{"error": {"code": 429, "message": "Resource exhausted", "status": "RESOURCE_EXHAUSTED"}}"#,
            "",
        ));
        assert_eq!(
            detail.as_deref(),
            Some("Gemini API error 429: Resource exhausted (RESOURCE_EXHAUSTED)")
        );
    }

    #[test]
    fn test_describe_failure_from_stderr_array() {
        let runner = GeminiRunner::default();
        let stderr = "Error when talking to Gemini API\n\
                      GaxiosError: [{\"error\": {\"code\": 403, \"message\": \"denied\", \"status\": \"PERMISSION_DENIED\"}}]\n\
                      An unexpected critical error occurred: [object Object]";
        let detail = runner.describe_failure(&outcome(1, "", stderr));
        assert_eq!(
            detail.as_deref(),
            Some("Gemini API error 403: denied (PERMISSION_DENIED)")
        );
    }

    #[test]
    fn test_describe_failure_from_stderr_object() {
        let runner = GeminiRunner::default();
        let stderr = "at foo (bar.js:1:2)\n{\"error\": {\"code\": 500, \"message\": \"internal\"}}";
        let detail = runner.describe_failure(&outcome(1, "not json", stderr));
        assert_eq!(detail.as_deref(), Some("Gemini API error 500: internal ()"));
    }

    #[test]
    fn test_describe_failure_ignores_sentinel_and_noise() {
        let runner = GeminiRunner::default();
        let sentinel = r#"{"error": {"code": 1, "message": "[object Object]"}}"#;
        assert!(runner.describe_failure(&outcome(1, sentinel, "")).is_none());
        assert!(runner.describe_failure(&outcome(1, "", "plain failure")).is_none());
        assert!(
            runner
                .describe_failure(&outcome(1, r#"{"response": "partial"}"#, ""))
                .is_none()
        );
    }
}
