//! BOSH Exporter Common Library
//!
//! This crate provides shared types and utilities for the BOSH Prometheus exporter:
//!
//! - [`deployment`] - Deployment snapshot data model (`DeploymentInfo`, `Release`, `Stemcell`, `Instance`)
//! - [`config`] - Configuration loading (JSON5 format)
//! - [`error`] - Error types

pub mod config;
pub mod deployment;
pub mod error;

// Re-export commonly used types at the crate root
pub use config::{BoshIdentity, LogFormat, LoggingConfig, load_config, parse_config};
pub use deployment::{
    DeploymentInfo, Instance, Release, Stemcell, current_timestamp_secs, load_snapshot,
    parse_snapshot,
};
pub use error::{Error, Result};

/// Initialize tracing with the given configuration.
///
/// Supports two output formats:
/// - `LogFormat::Text` (default): Human-readable text format
/// - `LogFormat::Json`: Structured JSON format for log aggregation systems
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    // Logs go to stderr so stdout stays clean for the exposition output.
    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
    }

    Ok(())
}
