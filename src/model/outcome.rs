//! Raw subprocess outcome.

use std::time::Duration;

/// What a finished (or killed) agent process produced.
///
/// Only the dispatch layer builds these; everything above it interprets
/// them. Output is decoded lossily as UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Exit code; a process killed by a signal reports 128 + signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Wall-clock time from spawn to reap.
    pub duration: Duration,
    /// The process was killed because the deadline expired.
    pub timed_out: bool,
    /// The process was killed because the caller cancelled the invocation.
    pub cancelled: bool,
}

impl ProcessOutcome {
    pub(crate) fn new(
        exit_code: i32,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration,
            timed_out: false,
            cancelled: false,
        }
    }

    pub(crate) fn with_timed_out(mut self) -> Self {
        self.timed_out = true;
        self
    }

    pub(crate) fn with_cancelled(mut self) -> Self {
        self.cancelled = true;
        self
    }

    /// True when the process ran to completion and exited zero.
    pub fn is_success(&self) -> bool {
        !self.timed_out && !self.cancelled && self.exit_code == 0
    }
}
