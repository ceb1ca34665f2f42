//! Agent registration table and runner construction.
//!
//! The table below is the only place that maps agent identifiers to
//! implementations. Adding an agent means adding a runner module and one
//! `Registration` entry; nothing else branches on agent identity.

use crate::agent::claude::{self, ClaudeRunner};
use crate::agent::codex::{self, CodexRunner};
use crate::agent::detect::detect;
use crate::agent::dispatch::ProcessExecutor;
use crate::agent::gemini::{self, GeminiRunner};
use crate::agent::runner::Runner;
use crate::config::{AgentSettings, Config};
use crate::error::{BridgeError, Result};
use crate::model::AgentId;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// When an agent CLI can emit JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonSupport {
    Always,
    /// From this `major.minor.patch` release on.
    Since(u64, u64, u64),
}

/// Static description of one supported agent.
pub struct Registration {
    pub id: AgentId,
    pub default_binary: &'static str,
    /// Regex whose first group is the version in `--version` output.
    pub version_pattern: &'static str,
    pub json_support: JsonSupport,
    construct: fn(AgentSettings) -> Box<dyn Runner>,
}

static REGISTRY: [Registration; 3] = [
    Registration {
        id: AgentId::Gemini,
        default_binary: gemini::DEFAULT_BINARY,
        version_pattern: r"v?(\d+\.\d+\.\d+(?:-[\w.]+)?)",
        json_support: JsonSupport::Since(0, 6, 0),
        construct: gemini_runner,
    },
    Registration {
        id: AgentId::Codex,
        default_binary: codex::DEFAULT_BINARY,
        version_pattern: r"version\s+(\d+\.\d+\.\d+)",
        json_support: JsonSupport::Always,
        construct: codex_runner,
    },
    Registration {
        id: AgentId::Claude,
        default_binary: claude::DEFAULT_BINARY,
        version_pattern: r"v?(\d+\.\d+\.\d+)",
        json_support: JsonSupport::Always,
        construct: claude_runner,
    },
];

fn gemini_runner(settings: AgentSettings) -> Box<dyn Runner> {
    Box::new(GeminiRunner::new(settings))
}

fn codex_runner(settings: AgentSettings) -> Box<dyn Runner> {
    Box::new(CodexRunner::new(settings))
}

fn claude_runner(settings: AgentSettings) -> Box<dyn Runner> {
    Box::new(ClaudeRunner::new(settings))
}

/// Every registered agent, in registration order.
pub fn registrations() -> &'static [Registration] {
    &REGISTRY
}

/// Look up the registration for `id`.
pub fn registration(id: AgentId) -> Option<&'static Registration> {
    REGISTRY.iter().find(|r| r.id == id)
}

/// Builds runners from the registration table and per-agent settings.
///
/// Runners hold no per-call state, so a fresh one per invocation is cheap.
/// JSON capability detected for agents whose `json_output` is unset is
/// cached for the life of the factory.
#[derive(Debug, Clone, Default)]
pub struct RunnerFactory {
    settings: BTreeMap<AgentId, AgentSettings>,
    json_capability: Arc<Mutex<BTreeMap<AgentId, bool>>>,
}

impl RunnerFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            settings: config.agents.clone(),
            json_capability: Arc::default(),
        }
    }

    /// Resolve `name` to a registered identifier.
    ///
    /// Names are case-sensitive. An unregistered name is an
    /// `UnknownAgent` error listing the available agents.
    pub fn agent_id(&self, name: &str) -> Result<AgentId> {
        self.lookup(name).map(|r| r.id)
    }

    fn lookup(&self, name: &str) -> Result<&'static Registration> {
        AgentId::from_name(name)
            .and_then(registration)
            .ok_or_else(|| BridgeError::UnknownAgent {
                name: name.to_string(),
                available: self.list_agents(),
            })
    }

    /// Create the runner registered under `name` with the configured
    /// settings as they are.
    pub fn create(&self, name: &str) -> Result<Box<dyn Runner>> {
        let registration = self.lookup(name)?;
        Ok((registration.construct)(self.settings(registration.id)))
    }

    /// Create the runner for `id`, first filling an unset `json_output`
    /// from the installed CLI's version.
    ///
    /// Agents that always emit JSON are never checked. The check runs at
    /// most once per agent; a CLI that cannot be found or whose version
    /// cannot be read is treated as lacking JSON output.
    pub fn create_resolved(
        &self,
        id: AgentId,
        executor: &dyn ProcessExecutor,
    ) -> Result<Box<dyn Runner>> {
        let registration = self.lookup(id.as_str())?;
        let mut settings = self.settings(id);
        if settings.json_output.is_none() && registration.json_support != JsonSupport::Always {
            settings.json_output = Some(self.json_capability(registration, &settings, executor));
        }
        Ok((registration.construct)(settings))
    }

    fn json_capability(
        &self,
        registration: &Registration,
        settings: &AgentSettings,
        executor: &dyn ProcessExecutor,
    ) -> bool {
        let mut cache = match self.json_capability.lock() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        };
        *cache.entry(registration.id).or_insert_with(|| {
            let availability = detect(registration, settings, executor);
            tracing::debug!(
                agent = %registration.id,
                version = ?availability.version,
                supports_json = availability.supports_json,
                "resolved JSON output capability"
            );
            availability.supports_json
        })
    }

    /// Create the runner for an already-resolved identifier.
    pub fn create_for(&self, id: AgentId) -> Result<Box<dyn Runner>> {
        self.create(id.as_str())
    }

    /// Names accepted by [`create`](Self::create).
    pub fn list_agents(&self) -> Vec<String> {
        REGISTRY.iter().map(|r| r.id.as_str().to_string()).collect()
    }

    /// Settings the factory applies to `id`.
    pub fn settings(&self, id: AgentId) -> AgentSettings {
        self.settings.get(&id).cloned().unwrap_or_default()
    }
}
