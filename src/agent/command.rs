//! Agent command lines.
//!
//! A runner describes the process it wants as an `AgentCommand`: the argv,
//! how the prompt is delivered, and extra environment. The prompt is never
//! spliced into a shell string; it is either one whole argv element or the
//! child's standard input.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Flags whose following argument is a secret (`--api-key VALUE`).
static SECRET_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^--?[a-z0-9_-]*(token|secret|key|password)[a-z0-9_-]*$").unwrap()
});

/// Inline secrets (`--api-key=VALUE`, `OPENAI_API_KEY=VALUE`).
static SECRET_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(-{0,2}[a-z0-9_-]*(?:token|secret|key|password)[a-z0-9_-]*)=.+$").unwrap()
});

const MASK: &str = "***";

/// How the prompt reaches the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptDelivery {
    /// As (part of) a single command-line argument.
    Argument,
    /// Written to the child's standard input, which is then closed.
    Stdin,
}

/// A fully built agent invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentCommand {
    argv: Vec<String>,
    stdin: Option<String>,
    env: BTreeMap<String, String>,
    /// Index of the argv element carrying the prompt, and the length of the
    /// flag prefix inside it (`--prompt=`), for redaction.
    prompt_arg: Option<(usize, usize)>,
}

impl AgentCommand {
    /// Start a command for `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            argv: vec![program.into()],
            stdin: None,
            env: BTreeMap::new(),
            prompt_arg: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.argv.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv.extend(args.into_iter().map(Into::into));
        self
    }

    /// Pass the prompt as `{flag}={prompt}` in a single argument.
    ///
    /// The `=` form keeps prompts that start with `-` from being read as flags.
    pub fn prompt_flag(mut self, flag: &str, prompt: &str) -> Self {
        let prefix = format!("{}=", flag);
        self.prompt_arg = Some((self.argv.len(), prefix.len()));
        self.argv.push(format!("{}{}", prefix, prompt));
        self
    }

    /// Deliver the prompt on standard input.
    pub fn prompt_stdin(mut self, prompt: impl Into<String>) -> Self {
        self.stdin = Some(prompt.into());
        self
    }

    /// Merge extra environment variables for the child.
    pub fn envs(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// Arguments after the program name.
    pub fn arguments(&self) -> &[String] {
        &self.argv[1..]
    }

    /// Program followed by its arguments.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn stdin(&self) -> Option<&str> {
        self.stdin.as_deref()
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn delivery(&self) -> PromptDelivery {
        if self.stdin.is_some() {
            PromptDelivery::Stdin
        } else {
            PromptDelivery::Argument
        }
    }

    /// Shell-quoted command line with the prompt and secrets masked.
    ///
    /// This is the only form of a command that goes into errors and logs.
    pub fn redacted(&self) -> String {
        let mut out = Vec::with_capacity(self.argv.len());
        let mut mask_next = false;

        for (i, arg) in self.argv.iter().enumerate() {
            if let Some((index, prefix_len)) = self.prompt_arg
                && index == i
            {
                let prompt_chars = arg[prefix_len..].chars().count();
                out.push(format!("{}<prompt:{} chars>", &arg[..prefix_len], prompt_chars));
                mask_next = false;
                continue;
            }

            if mask_next {
                out.push(MASK.to_string());
                mask_next = false;
                continue;
            }

            if let Some(caps) = SECRET_ASSIGNMENT.captures(arg) {
                out.push(format!("{}={}", &caps[1], MASK));
            } else {
                if i > 0 && SECRET_FLAG.is_match(arg) {
                    mask_next = true;
                }
                out.push(arg.clone());
            }
        }

        shell_words::join(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_flag_keeps_prompt_in_one_argument() {
        let command = AgentCommand::new("gemini").prompt_flag("--prompt", "-rf everything");
        assert_eq!(command.argv(), &["gemini", "--prompt=-rf everything"]);
        assert_eq!(command.delivery(), PromptDelivery::Argument);
        assert_eq!(command.program(), "gemini");
        assert_eq!(command.arguments(), &["--prompt=-rf everything"]);
    }

    #[test]
    fn test_stdin_delivery() {
        let command = AgentCommand::new("codex").args(["exec", "-"]).prompt_stdin("hi");
        assert_eq!(command.delivery(), PromptDelivery::Stdin);
        assert_eq!(command.stdin(), Some("hi"));
        assert_eq!(command.redacted(), "codex exec -");
    }

    #[test]
    fn test_redaction_hides_prompt_text() {
        let command = AgentCommand::new("gemini")
            .prompt_flag("--prompt", "my secret plan")
            .args(["--model", "flash"]);
        assert_eq!(
            command.redacted(),
            "gemini '--prompt=<prompt:14 chars>' --model flash"
        );
    }

    #[test]
    fn test_redaction_masks_secret_flags_and_assignments() {
        let command = AgentCommand::new("agent").args([
            "--api-key",
            "sk-123",
            "--auth-token=abc",
            "OPENAI_API_KEY=sk-456",
            "--keep",
            "visible",
        ]);
        let redacted = command.redacted();
        assert!(!redacted.contains("sk-123"));
        assert!(!redacted.contains("abc"));
        assert!(!redacted.contains("sk-456"));
        assert!(redacted.contains("--api-key '***'"));
        assert!(redacted.contains("'--auth-token=***'"));
        assert!(redacted.contains("visible"));
    }

    #[test]
    fn test_env_is_merged_not_shown() {
        let mut env = BTreeMap::new();
        env.insert("GEMINI_API_KEY".to_string(), "secret".to_string());
        let command = AgentCommand::new("gemini").envs(&env);
        assert_eq!(command.env().get("GEMINI_API_KEY").map(String::as_str), Some("secret"));
        assert!(!command.redacted().contains("secret"));
    }
}
