//! Anthropic Claude Code CLI runner.
//!
//! ```text
//! claude -p --output-format json [extra_args] [--model M] [--resume S] [mode flags]
//! ```
//!
//! The prompt is read from stdin. The JSON answer carries the text in
//! `result` alongside cost and session fields, which end up in metadata.

use crate::agent::command::AgentCommand;
use crate::agent::runner::Runner;
use crate::config::AgentSettings;
use crate::error::Result;
use crate::model::{AgentId, ExecutionMode, InvocationRequest, option_names};

pub const DEFAULT_BINARY: &str = "claude";

const SUPPORTED_OPTIONS: [&str; 4] = [
    option_names::MODEL,
    option_names::EXECUTION_MODE,
    option_names::FILE_REFS,
    option_names::SESSION_ID,
];

#[derive(Debug, Clone, Default)]
pub struct ClaudeRunner {
    settings: AgentSettings,
}

impl ClaudeRunner {
    pub fn new(settings: AgentSettings) -> Self {
        Self { settings }
    }
}

impl Runner for ClaudeRunner {
    fn agent(&self) -> AgentId {
        AgentId::Claude
    }

    fn build_command(&self, request: &InvocationRequest) -> Result<AgentCommand> {
        let prompt = request.prompt_with_file_refs()?;
        let mut command = AgentCommand::new(self.settings.program(DEFAULT_BINARY))
            .args(["-p", "--output-format", "json"])
            .args(self.settings.extra_args.iter().cloned());

        let model = request
            .string_option(option_names::MODEL)?
            .or(self.settings.model.as_deref());
        if let Some(model) = model {
            command = command.args(["--model", model]);
        }

        if let Some(session) = request.string_option(option_names::SESSION_ID)? {
            command = command.args(["--resume", session]);
        }

        command = match request.execution_mode()? {
            ExecutionMode::Default => command,
            ExecutionMode::Sandbox => command.args(["--permission-mode", "plan"]),
            ExecutionMode::Yolo => command.arg("--dangerously-skip-permissions"),
        };

        Ok(command.prompt_stdin(prompt).envs(&self.settings.environment))
    }

    fn supports(&self, option: &str) -> bool {
        SUPPORTED_OPTIONS.contains(&option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::Options;
    use serde_json::json;

    fn request(prompt: &str, options: serde_json::Value) -> InvocationRequest {
        let options: Options = serde_json::from_value(options).unwrap();
        InvocationRequest::with_options(AgentId::Claude, prompt, options).unwrap()
    }

    #[test]
    fn test_build_command_basic() {
        let command = ClaudeRunner::default()
            .build_command(&request("summarize", json!({})))
            .unwrap();

        assert_eq!(command.argv(), &["claude", "-p", "--output-format", "json"]);
        assert_eq!(command.stdin(), Some("summarize"));
    }

    #[test]
    fn test_build_command_with_session_and_modes() {
        let runner = ClaudeRunner::default();

        let command = runner
            .build_command(&request(
                "continue",
                json!({"session_id": "abc-123", "model": "sonnet", "execution_mode": "sandbox"}),
            ))
            .unwrap();
        assert_eq!(
            command.argv(),
            &[
                "claude",
                "-p",
                "--output-format",
                "json",
                "--model",
                "sonnet",
                "--resume",
                "abc-123",
                "--permission-mode",
                "plan",
            ]
        );

        let yolo = runner
            .build_command(&request("go", json!({"execution_mode": "yolo"})))
            .unwrap();
        assert_eq!(
            yolo.argv().last().map(String::as_str),
            Some("--dangerously-skip-permissions")
        );
    }

    #[test]
    fn test_session_id_must_be_a_string() {
        let err = ClaudeRunner::default()
            .build_command(&request("x", json!({"session_id": 7})))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("session_id"));
    }

    #[test]
    fn test_supported_options() {
        let runner = ClaudeRunner::default();
        for option in ["model", "execution_mode", "file_refs", "session_id"] {
            assert!(runner.supports(option), "{option}");
        }
        assert!(!runner.supports("sandbox"));
    }
}
