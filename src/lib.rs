//! check-wildfly library
//!
//! This crate provides a Nagios-compatible probe for the HTTP management
//! API of WildFly application servers: one metric is fetched, compared
//! against thresholds and reported as a status line with an exit code.

pub mod check;
pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod state;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging subsystem
///
/// Logs are written to stderr; stdout carries only the status line.
///
/// # Arguments
/// * `level` - Log level string (trace, debug, info, warn, error)
///
/// # Errors
/// Returns an error if the logging system fails to initialize
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
