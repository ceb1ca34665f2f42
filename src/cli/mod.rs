//! CLI argument parsing for nexus.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgAction, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

/// Nexus: expose command-line AI agents as uniform structured tools.
///
/// Each agent CLI (gemini, codex, claude) is run as a subprocess and its
/// output is normalized into one result shape.
#[derive(Parser, Debug)]
#[command(name = "nexus")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a YAML config file (overrides NEXUS_CONFIG).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for nexus.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the JSON-RPC tool server on stdin/stdout.
    Serve,

    /// Send one prompt to one agent.
    ///
    /// Prints the answer's content, or the full result as JSON with `--json`.
    Prompt(PromptArgs),

    /// Run a JSON array of tasks concurrently.
    ///
    /// Prints the batch response as JSON; results keep input order.
    Batch(BatchArgs),

    /// List the registered agents.
    Agents(AgentsArgs),
}

/// Arguments for the `prompt` command.
#[derive(Parser, Debug)]
pub struct PromptArgs {
    /// Agent name (gemini, codex, claude).
    pub agent: String,

    /// Prompt text, or `-` to read it from stdin.
    pub prompt: String,

    /// Model to request from the agent.
    #[arg(long)]
    pub model: Option<String>,

    /// Execution mode: default, sandbox or yolo.
    #[arg(long)]
    pub mode: Option<String>,

    /// File path to reference in the prompt (repeatable).
    #[arg(long = "file-ref")]
    pub file_refs: Vec<String>,

    /// Session to resume (claude only).
    #[arg(long)]
    pub session_id: Option<String>,

    /// Extra option as key=value; the value is parsed as JSON when it can be.
    #[arg(long = "option", value_parser = parse_key_value)]
    pub options: Vec<(String, Value)>,

    /// Timeout in seconds (overrides the configured timeout).
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Print the full structured result as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `batch` command.
#[derive(Parser, Debug)]
pub struct BatchArgs {
    /// File holding a JSON array of tasks, or `-` for stdin.
    pub file: String,

    /// Maximum number of agents running at once.
    #[arg(long)]
    pub max_concurrency: Option<usize>,
}

/// Arguments for the `agents` command.
#[derive(Parser, Debug)]
pub struct AgentsArgs {
    /// Locate each agent's binary and report its version.
    #[arg(long)]
    pub detect: bool,
}

/// Parse `key=value`, reading the value as JSON and falling back to a string.
fn parse_key_value(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
