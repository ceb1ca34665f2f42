//! Command implementations for nexus.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Each command writes its normal output to stdout and
//! returns a `CommandError` carrying the exit code on failure.

mod agents;
mod batch;
mod prompt;
mod serve;

use crate::bridge::Bridge;
use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::error::BridgeError;
use crate::exit_codes;
use std::io::{self, Read};
use thiserror::Error;

/// Failure of a CLI command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl CommandError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        CommandError::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandError::Bridge(err) => err.exit_code(),
            CommandError::Io { .. } => exit_codes::IO_FAILURE,
        }
    }
}

pub type Result<T> = std::result::Result<T, CommandError>;

/// Dispatch a command to its implementation.
pub fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::resolve(cli.config.as_deref())?;
    let bridge = Bridge::new(config);

    match cli.command {
        Command::Serve => serve::cmd_serve(bridge),
        Command::Prompt(args) => {
            prompt::cmd_prompt(&bridge, args, io::stdin(), &mut io::stdout().lock())
        }
        Command::Batch(args) => {
            batch::cmd_batch(&bridge, args, io::stdin(), &mut io::stdout().lock())
        }
        Command::Agents(args) => agents::cmd_agents(&bridge, args, &mut io::stdout().lock()),
    }
}

/// Read all of `source` as text; `what` names it in the error.
fn read_all<R: Read>(mut source: R, what: &str) -> Result<String> {
    let mut text = String::new();
    source
        .read_to_string(&mut text)
        .map_err(|e| CommandError::io(format!("failed to read {}", what), e))?;
    Ok(text)
}

fn write_failed(e: io::Error) -> CommandError {
    CommandError::io("failed to write output", e)
}
