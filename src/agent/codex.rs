//! OpenAI Codex CLI runner.
//!
//! ```text
//! codex exec --skip-git-repo-check [extra_args] [--model M] <sandbox flags> -
//! ```
//!
//! The trailing `-` makes codex read the prompt from stdin. Output is plain
//! text, so results normally come back through the text fallback.

use crate::agent::command::AgentCommand;
use crate::agent::runner::Runner;
use crate::config::AgentSettings;
use crate::error::Result;
use crate::model::{AgentId, ExecutionMode, InvocationRequest, option_names};

pub const DEFAULT_BINARY: &str = "codex";

const SUPPORTED_OPTIONS: [&str; 3] = [
    option_names::MODEL,
    option_names::EXECUTION_MODE,
    option_names::FILE_REFS,
];

#[derive(Debug, Clone, Default)]
pub struct CodexRunner {
    settings: AgentSettings,
}

impl CodexRunner {
    pub fn new(settings: AgentSettings) -> Self {
        Self { settings }
    }
}

impl Runner for CodexRunner {
    fn agent(&self) -> AgentId {
        AgentId::Codex
    }

    fn build_command(&self, request: &InvocationRequest) -> Result<AgentCommand> {
        let prompt = request.prompt_with_file_refs()?;
        let mut command = AgentCommand::new(self.settings.program(DEFAULT_BINARY))
            .args(["exec", "--skip-git-repo-check"])
            .args(self.settings.extra_args.iter().cloned());

        let model = request
            .string_option(option_names::MODEL)?
            .or(self.settings.model.as_deref());
        if let Some(model) = model {
            command = command.args(["--model", model]);
        }

        command = match request.execution_mode()? {
            ExecutionMode::Default => command.args(["--sandbox", "read-only"]),
            ExecutionMode::Sandbox => command.args(["--sandbox", "workspace-write"]),
            ExecutionMode::Yolo => command.arg("--dangerously-bypass-approvals-and-sandbox"),
        };

        Ok(command
            .arg("-")
            .prompt_stdin(prompt)
            .envs(&self.settings.environment))
    }

    fn supports(&self, option: &str) -> bool {
        SUPPORTED_OPTIONS.contains(&option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::command::PromptDelivery;
    use crate::model::Options;
    use serde_json::json;

    fn request(prompt: &str, options: serde_json::Value) -> InvocationRequest {
        let options: Options = serde_json::from_value(options).unwrap();
        InvocationRequest::with_options(AgentId::Codex, prompt, options).unwrap()
    }

    #[test]
    fn test_build_command_reads_prompt_from_stdin() {
        let command = CodexRunner::default()
            .build_command(&request("--help is not a flag here", json!({})))
            .unwrap();

        assert_eq!(
            command.argv(),
            &["codex", "exec", "--skip-git-repo-check", "--sandbox", "read-only", "-"]
        );
        assert_eq!(command.delivery(), PromptDelivery::Stdin);
        assert_eq!(command.stdin(), Some("--help is not a flag here"));
    }

    #[test]
    fn test_execution_modes() {
        let runner = CodexRunner::default();

        let sandbox = runner
            .build_command(&request("x", json!({"execution_mode": "sandbox"})))
            .unwrap();
        assert!(sandbox.argv().windows(2).any(|w| w == ["--sandbox", "workspace-write"]));

        let yolo = runner
            .build_command(&request("x", json!({"execution_mode": "yolo"})))
            .unwrap();
        assert!(
            yolo.argv()
                .contains(&"--dangerously-bypass-approvals-and-sandbox".to_string())
        );
        assert!(!yolo.argv().contains(&"--sandbox".to_string()));
    }

    #[test]
    fn test_model_and_extra_args_precede_prompt_marker() {
        let runner = CodexRunner::new(AgentSettings {
            extra_args: vec!["--color".to_string(), "never".to_string()],
            model: Some("o4-mini".to_string()),
            ..AgentSettings::default()
        });
        let command = runner
            .build_command(&request("x", json!({"file_refs": ["a.rs", "b.rs"]})))
            .unwrap();

        assert_eq!(
            command.argv(),
            &[
                "codex",
                "exec",
                "--skip-git-repo-check",
                "--color",
                "never",
                "--model",
                "o4-mini",
                "--sandbox",
                "read-only",
                "-",
            ]
        );
        assert_eq!(command.stdin(), Some("x\n\nFile references:\n- a.rs\n- b.rs"));
    }

    #[test]
    fn test_invalid_mode_is_configuration_error() {
        let err = CodexRunner::default()
            .build_command(&request("x", json!({"execution_mode": "turbo"})))
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn test_session_id_not_supported() {
        let runner = CodexRunner::default();
        assert!(runner.supports("model"));
        assert!(runner.supports("execution_mode"));
        assert!(!runner.supports("session_id"));
    }
}
