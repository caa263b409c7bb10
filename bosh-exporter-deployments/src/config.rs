//! Configuration for the deployments exporter.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use bosh_exporter_common::{BoshIdentity, LoggingConfig, load_config, parse_config};

use crate::descriptor::is_valid_metric_name;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] bosh_exporter_common::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Director identity, exported as constant labels.
    #[serde(default)]
    pub bosh: BoshIdentity,

    /// Metric naming settings.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Where the deployments snapshot comes from.
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Deployment filtering settings.
    #[serde(default)]
    pub filters: FilterConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metric naming configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Metric name prefix (default: "bosh").
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Value of the `environment` label on every metric.
    #[serde(default)]
    pub environment: String,
}

fn default_namespace() -> String {
    "bosh".to_string()
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            environment: String::new(),
        }
    }
}

/// Snapshot location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Path to a JSON file holding the deployments array.
    #[serde(default)]
    pub path: Option<String>,
}

/// Deployment filtering configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Glob patterns for deployments to include (empty = all).
    #[serde(default)]
    pub include_deployments: Vec<String>,

    /// Glob patterns for deployments to exclude.
    #[serde(default)]
    pub exclude_deployments: Vec<String>,
}

impl ExporterConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: ExporterConfig = load_config(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = parse_config(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let namespace = &self.metrics.namespace;
        if !namespace.is_empty() && !is_valid_metric_name(namespace) {
            return Err(ConfigError::Validation(format!(
                "Invalid metrics namespace: {}",
                namespace
            )));
        }

        for pattern in self
            .filters
            .include_deployments
            .iter()
            .chain(&self.filters.exclude_deployments)
        {
            if let Err(e) = glob::Pattern::new(pattern) {
                return Err(ConfigError::Validation(format!(
                    "Invalid deployment pattern '{}': {}",
                    pattern, e
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bosh_exporter_common::LogFormat;

    #[test]
    fn test_parse_minimal_config() {
        let config = ExporterConfig::parse("{}").unwrap();

        assert_eq!(config.metrics.namespace, "bosh");
        assert!(config.metrics.environment.is_empty());
        assert!(config.bosh.name.is_empty());
        assert!(config.snapshot.path.is_none());
        assert!(config.filters.include_deployments.is_empty());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            bosh: {
                name: "my-bosh",
                uuid: "0f3a4e2c-1111-2222-3333-444455556666"
            },
            metrics: {
                namespace: "director",
                environment: "production"
            },
            snapshot: {
                path: "/var/lib/bosh/deployments.json"
            },
            filters: {
                include_deployments: ["cf", "cf-*"],
                exclude_deployments: ["cf-test"]
            },
            logging: {
                level: "debug",
                format: "json"
            }
        }"#;

        let config = ExporterConfig::parse(json).unwrap();

        assert_eq!(config.bosh.name, "my-bosh");
        assert_eq!(config.bosh.uuid, "0f3a4e2c-1111-2222-3333-444455556666");
        assert_eq!(config.metrics.namespace, "director");
        assert_eq!(config.metrics.environment, "production");
        assert_eq!(
            config.snapshot.path.as_deref(),
            Some("/var/lib/bosh/deployments.json")
        );
        assert_eq!(config.filters.include_deployments, vec!["cf", "cf-*"]);
        assert_eq!(config.filters.exclude_deployments, vec!["cf-test"]);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_empty_namespace_is_valid() {
        let config = ExporterConfig::parse(r#"{ metrics: { namespace: "" } }"#).unwrap();
        assert!(config.metrics.namespace.is_empty());
    }

    #[test]
    fn test_validate_invalid_namespace() {
        let result = ExporterConfig::parse(r#"{ metrics: { namespace: "bosh-exporter" } }"#);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid metrics namespace")
        );
    }

    #[test]
    fn test_validate_invalid_pattern() {
        let result = ExporterConfig::parse(r#"{ filters: { exclude_deployments: ["[cf"] } }"#);

        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ metrics: {{ environment: 'staging' }} }}").unwrap();

        let config = ExporterConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.metrics.environment, "staging");
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = ExporterConfig::load_from_file("/nonexistent/exporter.json5").unwrap_err();

        assert!(matches!(err, ConfigError::Load(_)));
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_parse_error() {
        let err = ExporterConfig::parse("{ metrics: ").unwrap_err();

        assert!(matches!(err, ConfigError::Load(_)));
        assert!(err.to_string().contains("Failed to parse config"));
    }
}
