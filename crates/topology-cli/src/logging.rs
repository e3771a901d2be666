//! Logging setup for the CLI
//!
//! Logs go to stderr so table and JSON output on stdout stay clean.

use anyhow::{Result, anyhow};
use std::str::FromStr;
use tracing::Level;

/// Pick the log level: `-v` and `-vv` win over the configured level
pub fn resolve_level(verbose: u8, configured: Option<&str>) -> Level {
    match verbose {
        0 => configured
            .and_then(|level| Level::from_str(level).ok())
            .unwrap_or(Level::WARN),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber
pub fn init_logging(verbose: u8, configured: Option<&str>) -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(resolve_level(verbose, configured))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}
