//! Agent CLI detection.
//!
//! Looks the configured binary up on `PATH`, asks it for `--version`, and
//! derives whether it can produce JSON output.

use crate::agent::command::AgentCommand;
use crate::agent::dispatch::{CancelToken, ProcessExecutor};
use crate::agent::factory::{JsonSupport, Registration};
use crate::config::AgentSettings;
use crate::model::AgentId;
use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Upper bound on one `--version` run.
pub const VERSION_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// What is known about one agent CLI on this host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentAvailability {
    pub agent: AgentId,
    /// Binary name or path that was looked up.
    pub binary: String,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub supports_json: bool,
}

/// Detect one registered agent using `settings` for the binary override.
pub fn detect(
    registration: &Registration,
    settings: &AgentSettings,
    executor: &dyn ProcessExecutor,
) -> AgentAvailability {
    let binary = settings.program(registration.default_binary).to_string();

    let path = match which::which(&binary) {
        Ok(path) => path,
        Err(e) => {
            tracing::debug!(agent = %registration.id, binary = %binary, "agent CLI not found: {}", e);
            return AgentAvailability {
                agent: registration.id,
                binary,
                found: false,
                path: None,
                version: None,
                supports_json: false,
            };
        }
    };

    let version = query_version(executor, &path, registration.version_pattern);
    let supports_json = version
        .as_deref()
        .is_some_and(|v| supports_json_output(registration.json_support, v));

    AgentAvailability {
        agent: registration.id,
        binary,
        found: true,
        path: Some(path),
        version,
        supports_json,
    }
}

fn query_version(
    executor: &dyn ProcessExecutor,
    path: &std::path::Path,
    pattern: &str,
) -> Option<String> {
    let command = AgentCommand::new(path.to_string_lossy()).arg("--version");
    match executor.run(&command, VERSION_QUERY_TIMEOUT, &CancelToken::new()) {
        Ok(outcome) if outcome.is_success() => parse_version(pattern, &outcome.stdout),
        Ok(outcome) => {
            tracing::debug!(
                program = %path.display(),
                exit_code = outcome.exit_code,
                timed_out = outcome.timed_out,
                "version query failed"
            );
            None
        }
        Err(e) => {
            tracing::debug!("version query failed: {}", e);
            None
        }
    }
}

/// Extract the version captured by `pattern`'s first group.
pub fn parse_version(pattern: &str, output: &str) -> Option<String> {
    let regex = Regex::new(pattern).ok()?;
    regex
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Whether `version` meets the agent's JSON output requirement.
///
/// Pre-release suffixes are ignored (`0.6.0-preview.4` counts as `0.6.0`).
/// Unparseable versions never qualify for a `Since` requirement.
pub fn supports_json_output(support: JsonSupport, version: &str) -> bool {
    match support {
        JsonSupport::Always => true,
        JsonSupport::Since(major, minor, patch) => {
            semver_triple(version).is_some_and(|v| v >= (major, minor, patch))
        }
    }
}

fn semver_triple(version: &str) -> Option<(u64, u64, u64)> {
    let base = version.split('-').next()?;
    let mut parts = base.split('.').map(|p| p.parse::<u64>().ok());
    let triple = (parts.next()??, parts.next()??, parts.next()??);
    if parts.next().is_some() {
        return None;
    }
    Some(triple)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::factory::registration;

    fn pattern(id: AgentId) -> &'static str {
        registration(id).unwrap().version_pattern
    }

    #[test]
    fn test_parse_version_per_agent() {
        assert_eq!(
            parse_version(pattern(AgentId::Gemini), "0.6.0-preview.4\n").as_deref(),
            Some("0.6.0-preview.4")
        );
        assert_eq!(
            parse_version(pattern(AgentId::Gemini), "v0.29.1").as_deref(),
            Some("0.29.1")
        );
        assert_eq!(
            parse_version(pattern(AgentId::Codex), "codex-cli version 0.46.0").as_deref(),
            Some("0.46.0")
        );
        assert_eq!(parse_version(pattern(AgentId::Codex), "codex-cli 0.46.0"), None);
        assert_eq!(
            parse_version(pattern(AgentId::Claude), "2.0.14 (Claude Code)").as_deref(),
            Some("2.0.14")
        );
        assert_eq!(parse_version(pattern(AgentId::Claude), "unknown"), None);
    }

    #[test]
    fn test_json_support_threshold() {
        let gemini = JsonSupport::Since(0, 6, 0);
        assert!(supports_json_output(gemini, "0.6.0"));
        assert!(supports_json_output(gemini, "0.6.0-preview.4"));
        assert!(supports_json_output(gemini, "0.29.1"));
        assert!(supports_json_output(gemini, "1.0.0"));
        assert!(!supports_json_output(gemini, "0.5.9"));
        assert!(!supports_json_output(gemini, "garbage"));
        assert!(!supports_json_output(gemini, "0.6"));

        assert!(supports_json_output(JsonSupport::Always, "anything"));
    }

    #[test]
    fn test_detect_missing_binary() {
        let settings = AgentSettings {
            binary: Some("nexus-no-such-agent-binary-xyz".to_string()),
            ..AgentSettings::default()
        };
        let executor = crate::test_support::RecordingExecutor::not_found();
        let availability = detect(registration(AgentId::Codex).unwrap(), &settings, &executor);

        assert!(!availability.found);
        assert_eq!(availability.binary, "nexus-no-such-agent-binary-xyz");
        assert!(availability.version.is_none());
        assert_eq!(executor.spawn_count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_detect_reads_version() {
        use crate::test_support::write_script;
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let script = write_script(temp_dir.path(), "gemini", "echo 0.5.2");
        let settings = AgentSettings {
            binary: Some(script.to_string_lossy().into_owned()),
            ..AgentSettings::default()
        };

        let availability = detect(
            registration(AgentId::Gemini).unwrap(),
            &settings,
            &crate::agent::dispatch::SubprocessExecutor,
        );
        assert!(availability.found);
        assert!(availability.path.is_some());
        assert_eq!(availability.version.as_deref(), Some("0.5.2"));
        assert!(!availability.supports_json);
    }
}
