//! Agent subprocess dispatch and execution.
//!
//! This module provides subprocess execution for agents with:
//!
//! - Prompt delivery on stdin or as an argument
//! - Concurrent draining of stdout/stderr
//! - Deadline and cancellation with process-group termination
//! - Environment variable merging

mod executor;

pub use executor::{
    CancelToken, DispatchError, OUTPUT_CAPTURE_LIMIT, ProcessExecutor, SubprocessExecutor,
};
