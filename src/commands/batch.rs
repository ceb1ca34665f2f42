//! Implementation of `nexus batch`.

use super::{CommandError, Result, read_all, write_failed};
use crate::agent::CancelToken;
use crate::bridge::{AgentTask, Bridge};
use crate::cli::BatchArgs;
use crate::error::BridgeError;
use std::io::{Read, Write};

/// Run a JSON array of tasks and print the batch response.
///
/// Per-task failures are part of the response; only unreadable or malformed
/// input fails the command.
pub fn cmd_batch<R: Read, W: Write>(
    bridge: &Bridge,
    args: BatchArgs,
    stdin: R,
    out: &mut W,
) -> Result<()> {
    let text = if args.file == "-" {
        read_all(stdin, "tasks from stdin")?
    } else {
        let file = std::fs::File::open(&args.file)
            .map_err(|e| CommandError::io(format!("failed to open '{}'", args.file), e))?;
        read_all(file, &format!("'{}'", args.file))?
    };

    let tasks: Vec<AgentTask> = serde_json::from_str(&text).map_err(|e| {
        BridgeError::configuration(format!("invalid batch input: expected a JSON array of tasks: {}", e))
    })?;

    if args.max_concurrency == Some(0) {
        return Err(BridgeError::invalid_key(
            "max_concurrency",
            "max_concurrency must be at least 1",
        )
        .into());
    }

    let response = bridge.batch(&tasks, args.max_concurrency, &CancelToken::new());
    tracing::info!(
        succeeded = response.succeeded(),
        failed = response.failed(),
        "batch finished"
    );

    let json = serde_json::to_string_pretty(&response)
        .map_err(|e| CommandError::io("failed to encode batch response", e.into()))?;
    writeln!(out, "{}", json).map_err(write_failed)?;
    Ok(())
}
