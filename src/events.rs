//! Invocation audit log.
//!
//! When `event_log` is configured, every invocation appends records in NDJSON
//! format (one JSON object per line). Records describe what ran and how it
//! ended; agent output is never written.
//!
//! # Event Format
//!
//! Each event is a JSON object with the following fields:
//! - `ts`: RFC3339 timestamp
//! - `action`: `invoke_start`, `invoke_complete` or `invoke_failed`
//! - `actor`: The owner string (e.g., `user@HOST`)
//! - `agent`: Agent name
//! - `label`: Optional batch label
//! - `details`: Freeform object with action-specific details
//!
//! # Usage
//!
//! ```no_run
//! use nexus_bridge::events::{Event, EventAction, EventLog};
//! use nexus_bridge::model::AgentId;
//! use serde_json::json;
//!
//! let log = EventLog::new("/tmp/nexus-events.ndjson");
//! let event = Event::new(EventAction::InvokeStart, AgentId::Gemini)
//!     .with_details(json!({"timeout_seconds": 600}));
//! log.record(&event);
//! ```

use crate::model::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Invocation accepted, about to run
    InvokeStart,
    /// Invocation produced a result
    InvokeComplete,
    /// Invocation ended with a classified error
    InvokeFailed,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::InvokeStart => write!(f, "invoke_start"),
            EventAction::InvokeComplete => write!(f, "invoke_complete"),
            EventAction::InvokeFailed => write!(f, "invoke_failed"),
        }
    }
}

/// An event record for the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    pub action: EventAction,

    /// The actor running the bridge (e.g., `user@HOST`).
    pub actor: String,

    pub agent: AgentId,

    /// Batch label, when the invocation was part of a batch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    pub details: Value,
}

impl Event {
    /// Create a new event for `agent`.
    ///
    /// The timestamp is set to the current time, and the actor is
    /// determined from the environment (USER@HOSTNAME).
    pub fn new(action: EventAction, agent: AgentId) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: get_actor_string(),
            agent,
            label: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_label(mut self, label: Option<&str>) -> Self {
        self.label = label.map(str::to_string);
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Get the actor string for event metadata.
fn get_actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append-only NDJSON event file shared by concurrent invocations.
#[derive(Debug)]
pub struct EventLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an event as a single JSON line.
    ///
    /// The file and its parent directory are created if they don't exist.
    pub fn append(&self, event: &Event) -> io::Result<()> {
        let mut line = event.to_ndjson_line().map_err(io::Error::other)?;
        line.push('\n');

        let _guard = self.write_lock.lock().unwrap_or_else(|poison| poison.into_inner());

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()
    }

    /// Append an event, logging instead of failing when the write fails.
    pub fn record(&self, event: &Event) {
        if let Err(e) = self.append(event) {
            tracing::warn!(
                path = %self.path.display(),
                action = %event.action,
                "failed to write event log: {}",
                e
            );
        }
    }
}

/// Read all events from an event log file.
///
/// Lines that fail to parse are skipped.
pub fn read_events(path: &Path) -> io::Result<Vec<Event>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect())
}
