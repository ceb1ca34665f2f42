//! Data model shared by every layer of the bridge.
//!
//! - `AgentId`: the closed set of supported agents
//! - `InvocationRequest`: one prompt plus agent-specific options
//! - `ProcessOutcome`: ground truth from the subprocess, before interpretation
//! - `StructuredResult`: the normalized answer every runner returns

mod agent;
mod outcome;
mod request;
mod result;


pub use agent::AgentId;
pub use outcome::ProcessOutcome;
pub use request::{ExecutionMode, InvocationRequest, Options, option_names};
pub use result::{ResultFormat, StructuredResult, Truncation};
