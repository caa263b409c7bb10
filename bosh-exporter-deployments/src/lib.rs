//! Prometheus metrics for BOSH deployments.
//!
//! This crate turns a snapshot of BOSH deployments (releases, stemcells and
//! instances) into gauge metrics ready for scraping.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │     Source      │────>│    Collector    │────>│   Exposition    │
//! │ (static / file) │     │ (reset + tally) │     │  (text format)  │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! # Metrics
//!
//! | Name | Labels |
//! |------|--------|
//! | `<ns>_deployment_release_info` | `bosh_deployment`, `bosh_release_name`, `bosh_release_version` |
//! | `<ns>_deployment_stemcell_info` | `bosh_deployment`, `bosh_stemcell_name`, `bosh_stemcell_version`, `bosh_stemcell_os_name` |
//! | `<ns>_deployment_instance_count` | `bosh_deployment`, `bosh_vm_type` |
//! | `<ns>_last_deployments_scrape_timestamp` | |
//! | `<ns>_last_deployments_scrape_duration_seconds` | |
//!
//! Every metric also carries the constant labels `environment`, `bosh_name`
//! and `bosh_uuid`.
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod collector;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod exposition;
pub mod metric;
pub mod source;

pub use collector::{CollectorStats, DeploymentsCollector, SharedCollector};
pub use config::ExporterConfig;
pub use descriptor::{MetricDescriptor, Sample};
pub use error::{CollectError, SourceError};
pub use exposition::{Exporter, render};
pub use source::{DeploymentFilter, DeploymentsSource, FileSource, FilteredSource, StaticSource};
