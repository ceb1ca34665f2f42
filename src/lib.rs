//! Nexus bridge: run command-line AI agents as uniform structured tools.
//!
//! A prompt goes in as an [`InvocationRequest`](model::InvocationRequest),
//! a runner turns it into a concrete command line, the subprocess runs under
//! a timeout, and its output is normalized into a
//! [`StructuredResult`](model::StructuredResult). [`Bridge`](bridge::Bridge)
//! is the entry point used by the stdio server and the CLI.

pub mod agent;
pub mod bridge;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod logging;
pub mod model;
pub mod parser;
pub mod server;

#[cfg(test)]
mod test_support;
