use thiserror::Error;

/// Common error type for BOSH exporter components.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid snapshot: {0}")]
    Snapshot(String),
}

/// Result type alias using the exporter's Error.
pub type Result<T> = std::result::Result<T, Error>;
