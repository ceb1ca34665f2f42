//! The runner contract and the execution pipeline shared by every agent.
//!
//! A concrete runner only knows how to build its command line and which
//! options it accepts. Spawning, deadlines, cancellation, the exit-code
//! policy and output parsing all live in [`execute_with`], so agents cannot
//! drift apart on those concerns.

use crate::agent::command::AgentCommand;
use crate::agent::dispatch::{CancelToken, DispatchError, ProcessExecutor, SubprocessExecutor};
use crate::error::{BridgeError, Result};
use crate::model::{AgentId, InvocationRequest, ProcessOutcome, StructuredResult};
use crate::parser::parse_output;
use std::io;
use std::time::Duration;

/// Integration with one external agent CLI.
pub trait Runner: Send + Sync {
    /// The agent this runner was registered for.
    fn agent(&self) -> AgentId;

    /// Build the command line for `request`.
    ///
    /// Pure and deterministic. Option values of the wrong shape are reported
    /// as `Configuration` errors.
    fn build_command(&self, request: &InvocationRequest) -> Result<AgentCommand>;

    /// Whether the option named `option` is understood by this agent.
    fn supports(&self, option: &str) -> bool;

    /// Extra context for a non-zero exit, such as an API error the CLI
    /// printed. Does not change the outcome.
    fn describe_failure(&self, _outcome: &ProcessOutcome) -> Option<String> {
        None
    }

    /// Run `request` as a real subprocess bounded by `timeout`.
    fn execute(&self, request: &InvocationRequest, timeout: Duration) -> Result<StructuredResult> {
        execute_with(
            self,
            &SubprocessExecutor,
            request,
            &ExecuteOptions::new(timeout),
        )
    }
}

/// Per-invocation knobs for [`execute_with`].
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    pub timeout: Duration,
    /// Truncate `content` and `raw` beyond this many bytes.
    pub output_limit: Option<usize>,
    pub cancel: CancelToken,
}

impl ExecuteOptions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            output_limit: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_output_limit(mut self, limit: usize) -> Self {
        self.output_limit = Some(limit);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Validate, spawn, await and parse one invocation.
///
/// # Arguments
///
/// * `runner` - The agent integration
/// * `executor` - Process executor (real subprocesses or a test double)
/// * `request` - The invocation request
/// * `options` - Timeout, output limit and cancellation token
///
/// # Returns
///
/// * `Ok(StructuredResult)` - The agent exited 0 and its stdout was parsed
/// * `Err(BridgeError)` - Exactly one classified failure; no process is left running
pub fn execute_with<R: Runner + ?Sized>(
    runner: &R,
    executor: &dyn ProcessExecutor,
    request: &InvocationRequest,
    options: &ExecuteOptions,
) -> Result<StructuredResult> {
    let agent = runner.agent();
    if request.agent() != agent {
        return Err(BridgeError::configuration(format!(
            "request for '{}' cannot be run by the {} runner",
            request.agent(),
            agent
        ))
        .for_agent(agent));
    }

    validate_options(runner, request)?;

    let command = runner.build_command(request)?;
    let redacted = command.redacted();
    tracing::debug!(
        agent = %agent,
        command = %redacted,
        delivery = ?command.delivery(),
        "built agent command"
    );

    if options.cancel.is_cancelled() {
        return Err(BridgeError::Cancelled {
            agent,
            command: redacted,
        });
    }

    let outcome = executor
        .run(&command, options.timeout, &options.cancel)
        .map_err(|e| match e {
            DispatchError::Spawn { program, source } => {
                spawn_failed(agent, program, redacted.clone(), source)
            }
            DispatchError::Wait { source, .. } => BridgeError::AgentExecution {
                agent,
                exit_code: -1,
                stderr: String::new(),
                command: redacted.clone(),
                detail: Some(format!("lost track of the agent process: {}", source)),
            },
        })?;

    if outcome.cancelled {
        tracing::warn!(agent = %agent, "agent invocation cancelled; process tree terminated");
        return Err(BridgeError::Cancelled {
            agent,
            command: redacted,
        });
    }

    if outcome.timed_out {
        tracing::warn!(
            agent = %agent,
            timeout_secs = options.timeout.as_secs_f64(),
            "agent timed out; process tree terminated"
        );
        return Err(BridgeError::Timeout {
            agent,
            timeout: options.timeout,
            command: redacted,
            partial_stdout: outcome.stdout,
            partial_stderr: outcome.stderr,
        });
    }

    if outcome.exit_code != 0 {
        let detail = runner.describe_failure(&outcome);
        tracing::warn!(
            agent = %agent,
            exit_code = outcome.exit_code,
            duration_ms = outcome.duration.as_millis() as u64,
            "agent exited with failure"
        );
        return Err(BridgeError::AgentExecution {
            agent,
            exit_code: outcome.exit_code,
            stderr: outcome.stderr,
            command: redacted,
            detail,
        });
    }

    let mut result = parse_output(&outcome.stdout);
    if let Some(limit) = options.output_limit {
        result = result.truncated(limit);
    }

    tracing::info!(
        agent = %agent,
        exit_code = outcome.exit_code,
        duration_ms = outcome.duration.as_millis() as u64,
        format = ?result.format,
        truncated = result.truncation.is_some(),
        "agent invocation completed"
    );

    Ok(result)
}

/// Classify a failed spawn: only a missing or unrunnable executable means
/// the agent is not installed.
fn spawn_failed(
    agent: AgentId,
    program: String,
    command: String,
    source: io::Error,
) -> BridgeError {
    match source.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => BridgeError::AgentNotFound {
            agent,
            program,
            command,
            source,
        },
        io::ErrorKind::ArgumentListTooLong => BridgeError::invalid_key(
            "prompt",
            format!(
                "prompt is too large to pass as a command-line argument to '{}': {}",
                program, source
            ),
        )
        .for_agent(agent),
        _ => BridgeError::AgentExecution {
            agent,
            exit_code: -1,
            stderr: String::new(),
            command,
            detail: Some(format!("failed to start '{}': {}", program, source)),
        },
    }
}

/// Reject options the runner does not understand before anything is spawned.
fn validate_options<R: Runner + ?Sized>(runner: &R, request: &InvocationRequest) -> Result<()> {
    for name in request.options().keys() {
        if !runner.supports(name) {
            return Err(BridgeError::invalid_key(
                name.clone(),
                format!(
                    "option '{}' is not supported by the {} agent",
                    name,
                    runner.agent()
                ),
            )
            .for_agent(runner.agent()));
        }
    }
    Ok(())
}
