//! Agent identifiers.

use serde::{Deserialize, Serialize};

/// Identifier of a supported agent.
///
/// The set is closed: names that do not map to a variant are rejected at
/// the factory boundary, never silently mapped to a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentId {
    /// Google Gemini CLI.
    Gemini,
    /// OpenAI Codex CLI.
    Codex,
    /// Anthropic Claude Code CLI.
    Claude,
}

impl AgentId {
    /// Every supported agent, in registration order.
    pub const ALL: [AgentId; 3] = [AgentId::Gemini, AgentId::Codex, AgentId::Claude];

    /// The wire name of this agent (e.g. `"gemini"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::Gemini => "gemini",
            AgentId::Codex => "codex",
            AgentId::Claude => "claude",
        }
    }

    /// Look up an agent by its exact (case-sensitive) name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == name)
    }

    /// Upper-cased name used in `NEXUS_{AGENT}_*` environment variables.
    pub fn env_prefix(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
