//! Agent subprocess executor.
//!
//! Executes agent commands with timeout, cancellation, output capture, and error handling.

use crate::agent::command::AgentCommand;
use crate::model::ProcessOutcome;
use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Maximum bytes kept in memory per output stream; the rest is drained and dropped.
pub const OUTPUT_CAPTURE_LIMIT: usize = 16 * 1024 * 1024;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// How long to wait for output pipes to close after the process is gone.
const READER_GRACE: Duration = Duration::from_secs(2);

/// Shared flag used to cancel an in-flight invocation from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Failure to start or supervise a process.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Runs an `AgentCommand` to completion, expiry, or cancellation.
///
/// Timeouts and cancellation are reported through the outcome flags, not as
/// errors; the process tree is already terminated when `run` returns.
pub trait ProcessExecutor: Send + Sync {
    fn run(
        &self,
        command: &AgentCommand,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<ProcessOutcome, DispatchError>;
}

/// Executes commands as real OS subprocesses.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubprocessExecutor;

impl ProcessExecutor for SubprocessExecutor {
    fn run(
        &self,
        command: &AgentCommand,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<ProcessOutcome, DispatchError> {
        let mut process = Command::new(command.program());
        process
            .args(command.arguments())
            .stdin(if command.stdin().is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Merge environment variables
        for (key, value) in command.env() {
            process.env(key, value);
        }
        isolate_process_group(&mut process);

        // Spawn the process
        let start_time = Instant::now();
        let mut child = process.spawn().map_err(|source| DispatchError::Spawn {
            program: command.program().to_string(),
            source,
        })?;
        tracing::debug!(
            program = command.program(),
            pid = child.id(),
            "spawned agent process"
        );

        let stdin_writer = child
            .stdin
            .take()
            .map(|pipe| feed_stdin(pipe, command.stdin().unwrap_or_default().to_string()));
        let stdout_reader = child.stdout.take().map(drain);
        let stderr_reader = child.stderr.take().map(drain);

        // Wait with timeout
        let waited = wait_with_deadline(&mut child, timeout, cancel);
        let duration = start_time.elapsed();

        let stdout = collect_output(stdout_reader, &mut child);
        let stderr = collect_output(stderr_reader, &mut child);
        if let Some(writer) = stdin_writer {
            if writer.is_finished() {
                let _ = writer.join();
            } else {
                // Blocked on a pipe whose reader is gone; it exits once the write fails
                tracing::debug!(
                    program = command.program(),
                    "stdin writer still running; detaching it"
                );
            }
        }

        let status = waited.map_err(|source| DispatchError::Wait {
            program: command.program().to_string(),
            source,
        })?;

        Ok(match status {
            Wait::Exited(status) => {
                ProcessOutcome::new(exit_code_of(status), stdout, stderr, duration)
            }
            Wait::TimedOut(status) => {
                ProcessOutcome::new(exit_code_of(status), stdout, stderr, duration)
                    .with_timed_out()
            }
            Wait::Cancelled(status) => {
                ProcessOutcome::new(exit_code_of(status), stdout, stderr, duration)
                    .with_cancelled()
            }
        })
    }
}

enum Wait {
    Exited(ExitStatus),
    TimedOut(ExitStatus),
    Cancelled(ExitStatus),
}

/// Wait for a child process with timeout and cancellation.
///
/// On expiry or cancellation the whole process group is killed and reaped
/// before returning.
fn wait_with_deadline(child: &mut Child, timeout: Duration, cancel: &CancelToken) -> io::Result<Wait> {
    let start = Instant::now();

    loop {
        // Check if process has exited
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Wait::Exited(status)),
            Ok(None) => {
                if cancel.is_cancelled() {
                    return terminate(child).map(Wait::Cancelled);
                }
                let elapsed = start.elapsed();
                if elapsed >= timeout {
                    return terminate(child).map(Wait::TimedOut);
                }
                thread::sleep(POLL_INTERVAL.min(timeout - elapsed));
            }
            Err(e) => {
                let _ = terminate(child);
                return Err(e);
            }
        }
    }
}

/// Kill the process tree and reap the child.
fn terminate(child: &mut Child) -> io::Result<ExitStatus> {
    kill_process_tree(child);
    child.wait()
}

/// Put the child in its own process group so the whole tree can be signalled.
#[cfg(unix)]
fn isolate_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn isolate_process_group(_command: &mut Command) {}

#[cfg(unix)]
fn kill_process_tree(child: &mut Child) {
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        let _ = child.kill();
        return;
    };
    // SAFETY: killpg only sends a signal. The group was created for this child
    // by `process_group(0)`, so its id is the child's pid.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_process_tree(child: &mut Child) {
    // TerminateProcess; descendants are not tracked on this platform.
    let _ = child.kill();
}

fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

fn feed_stdin(mut pipe: ChildStdin, input: String) -> JoinHandle<()> {
    thread::spawn(move || {
        // The agent may exit without reading its input; that is not our failure.
        if let Err(e) = pipe.write_all(input.as_bytes())
            && e.kind() != io::ErrorKind::BrokenPipe
        {
            tracing::debug!("failed to write prompt to agent stdin: {}", e);
        }
    })
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut captured = Vec::new();
        let mut buf = [0u8; 8192];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    let room = OUTPUT_CAPTURE_LIMIT.saturating_sub(captured.len());
                    captured.extend_from_slice(&buf[..n.min(room)]);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        captured
    })
}

/// Join an output reader, killing stragglers that keep the pipe open.
fn collect_output(reader: Option<JoinHandle<Vec<u8>>>, child: &mut Child) -> String {
    let Some(handle) = reader else {
        return String::new();
    };

    if !wait_finished(&handle, READER_GRACE) {
        // A descendant still holds the pipe open.
        kill_process_tree(child);
        if !wait_finished(&handle, READER_GRACE) {
            tracing::warn!("agent output pipe still open after termination; abandoning reader");
            return String::new();
        }
    }

    handle
        .join()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

fn wait_finished<T>(handle: &JoinHandle<T>, grace: Duration) -> bool {
    let start = Instant::now();
    while !handle.is_finished() {
        if start.elapsed() >= grace {
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    }
    true
}
