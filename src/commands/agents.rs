//! Implementation of `nexus agents`.

use super::{Result, write_failed};
use crate::bridge::Bridge;
use crate::cli::AgentsArgs;
use std::io::Write;

/// List registered agents, optionally probing each CLI on this host.
pub fn cmd_agents<W: Write>(bridge: &Bridge, args: AgentsArgs, out: &mut W) -> Result<()> {
    if !args.detect {
        for agent in bridge.list_agents() {
            writeln!(out, "{}", agent).map_err(write_failed)?;
        }
        return Ok(());
    }

    for availability in bridge.detect_agents() {
        let line = if availability.found {
            let path = availability
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            format!(
                "{:<8} found    {:<12} json={:<5} {}",
                availability.agent.as_str(),
                availability.version.as_deref().unwrap_or("unknown"),
                availability.supports_json,
                path
            )
        } else {
            format!(
                "{:<8} missing  ('{}' not on PATH)",
                availability.agent.as_str(),
                availability.binary
            )
        };
        writeln!(out, "{}", line).map_err(write_failed)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AgentSettings, Config};
    use crate::model::AgentId;
    use crate::test_support::{RecordingExecutor, outcome};
    use std::sync::Arc;

    #[test]
    fn lists_agent_names() {
        let bridge = Bridge::with_executor(
            Config::default(),
            Arc::new(RecordingExecutor::returning(outcome(0, "", ""))),
        );
        let mut out = Vec::new();

        cmd_agents(&bridge, AgentsArgs { detect: false }, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "gemini\ncodex\nclaude\n");
    }

    #[test]
    fn detect_reports_missing_binaries() {
        let mut config = Config::default();
        config.agents.insert(
            AgentId::Codex,
            AgentSettings {
                binary: Some("nexus-no-such-codex".to_string()),
                ..AgentSettings::default()
            },
        );
        let bridge = Bridge::with_executor(config, Arc::new(RecordingExecutor::not_found()));
        let mut out = Vec::new();

        cmd_agents(&bridge, AgentsArgs { detect: true }, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let codex = text.lines().find(|l| l.starts_with("codex")).unwrap();
        assert!(codex.contains("missing"));
        assert!(codex.contains("nexus-no-such-codex"));
        assert_eq!(text.lines().count(), 3);
    }
}
