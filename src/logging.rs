//! Tracing subscriber setup.
//!
//! Logs go to stderr; stdout carries protocol and command output only.

use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding a filter directive, checked before `RUST_LOG`.
pub const LOG_ENV: &str = "NEXUS_LOG";

/// Install the global subscriber.
///
/// The filter comes from `NEXUS_LOG`, then `RUST_LOG`, then the verbosity
/// count (`-v`, `-vv`, ...). Calling this twice is harmless.
pub fn init(verbosity: u8) {
    let filter = filter_from(
        std::env::var(LOG_ENV).ok(),
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
        verbosity,
    );

    let _ = fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(filter)
        .with_target(verbosity != 0)
        .try_init();
}

fn filter_from(nexus_log: Option<String>, rust_log: Option<String>, verbosity: u8) -> EnvFilter {
    [nexus_log, rust_log]
        .into_iter()
        .flatten()
        .filter(|directive| !directive.trim().is_empty())
        .find_map(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive(verbosity)))
}

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "nexus_bridge=info",
        2 => "nexus_bridge=debug",
        _ => "trace",
    }
}
