//! Implementation of `nexus prompt`.

use super::{CommandError, Result, read_all, write_failed};
use crate::bridge::{AgentTask, Bridge, CallOptions};
use crate::cli::PromptArgs;
use crate::error::BridgeError;
use std::io::{Read, Write};
use std::time::Duration;

/// Run one prompt and print the answer.
///
/// A prompt of `-` is read from `stdin`. Without `--json` only the content
/// is printed; with it, the whole structured result.
pub fn cmd_prompt<R: Read, W: Write>(
    bridge: &Bridge,
    args: PromptArgs,
    stdin: R,
    out: &mut W,
) -> Result<()> {
    let prompt = if args.prompt == "-" {
        read_all(stdin, "prompt from stdin")?
    } else {
        args.prompt.clone()
    };

    let timeout = match args.timeout {
        Some(secs) if !secs.is_finite() || secs <= 0.0 => {
            return Err(
                BridgeError::invalid_key("timeout", "timeout must be greater than 0").into(),
            );
        }
        Some(secs) => Some(Duration::try_from_secs_f64(secs).map_err(|e| {
            BridgeError::invalid_key("timeout", format!("timeout is out of range: {}", e))
        })?),
        None => None,
    };

    let task = AgentTask {
        options: args.options.into_iter().collect(),
        model: args.model,
        execution_mode: args.mode,
        file_refs: (!args.file_refs.is_empty()).then_some(args.file_refs),
        session_id: args.session_id,
        ..AgentTask::new(args.agent, prompt)
    };

    let call = CallOptions {
        timeout,
        ..CallOptions::default()
    };
    let result = bridge.invoke_with(&task.agent, &task.prompt, task.merged_options(), &call)?;

    if args.json {
        let text = serde_json::to_string_pretty(&result)
            .map_err(|e| CommandError::io("failed to encode result", e.into()))?;
        writeln!(out, "{}", text).map_err(write_failed)?;
    } else {
        writeln!(out, "{}", result.content).map_err(write_failed)?;
    }
    Ok(())
}
