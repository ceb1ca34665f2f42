//! Exit code constants for the nexus CLI.
//!
//! Each error kind gets its own code so scripts can tell failures apart:
//! - 0: Success
//! - 1: Configuration error (bad option, malformed request, bad config)
//! - 2: Unknown agent identifier
//! - 3: Agent binary not found on this host
//! - 4: Agent exited non-zero
//! - 5: Agent timed out
//! - 6: Invocation cancelled
//! - 7: CLI input/output failure (unreadable batch file, closed stdout)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// Configuration error: unsupported option, malformed request, invalid config.
pub const CONFIGURATION_ERROR: i32 = 1;

/// The requested agent identifier is not registered.
pub const UNKNOWN_AGENT: i32 = 2;

/// The agent executable could not be located or started.
pub const AGENT_NOT_FOUND: i32 = 3;

/// The agent ran but exited with a non-zero code.
pub const AGENT_EXECUTION_FAILURE: i32 = 4;

/// The agent did not finish within the configured bound.
pub const TIMEOUT: i32 = 5;

/// The invocation was cancelled before the agent finished.
pub const CANCELLED: i32 = 6;

/// The CLI could not read its input or write its output.
pub const IO_FAILURE: i32 = 7;
