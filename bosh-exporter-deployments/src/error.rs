//! Error types for collecting deployment metrics.

use thiserror::Error;

/// Failure to obtain a deployments snapshot.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read snapshot '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: bosh_exporter_common::Error,
    },

    #[error("Snapshot source unavailable: {0}")]
    Unavailable(String),
}

/// Errors reported by a collection pass.
#[derive(Debug, Error)]
pub enum CollectError {
    /// The snapshot could not be fetched. No metric was modified.
    #[error("Deployments snapshot unavailable: {0}")]
    SnapshotUnavailable(#[from] SourceError),

    /// A label set did not match the family's declared labels.
    #[error("Metric {metric} expects {expected} label values, got {actual}")]
    InconsistentLabels {
        metric: String,
        expected: usize,
        actual: usize,
    },
}
