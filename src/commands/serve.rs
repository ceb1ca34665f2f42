//! Implementation of `nexus serve`.

use super::{CommandError, Result};
use crate::bridge::Bridge;
use crate::server;
use std::io;
use std::sync::Arc;

/// Serve tool calls on stdin/stdout until stdin closes.
pub fn cmd_serve(bridge: Bridge) -> Result<()> {
    let stdin = io::stdin().lock();
    server::serve(Arc::new(bridge), stdin, io::stdout())
        .map_err(|e| CommandError::io("tool server stopped", e))
}
