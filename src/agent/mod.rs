//! Agent integration subsystem.
//!
//! This module provides everything between an `InvocationRequest` and a
//! `StructuredResult`:
//!
//! - **Runner**: the contract each agent satisfies and the shared pipeline
//! - **Factory**: the closed registration table mapping names to runners
//! - **Runners**: gemini, codex and claude command construction
//! - **Dispatch**: subprocess execution with deadline and cancellation
//! - **Detect**: PATH lookup and `--version` probing
//!
//! # Design Philosophy
//!
//! Runners only describe commands. Everything that touches a process lives
//! in one pipeline, so exit-code policy and termination behave the same for
//! every agent.

pub mod claude;
pub mod codex;
pub mod command;
pub mod detect;
pub mod dispatch;
pub mod factory;
pub mod gemini;
mod runner;


// Re-export public API
pub use command::{AgentCommand, PromptDelivery};
pub use detect::{AgentAvailability, detect};
pub use dispatch::{CancelToken, ProcessExecutor, SubprocessExecutor};
pub use factory::RunnerFactory;
pub use runner::{ExecuteOptions, Runner, execute_with};
