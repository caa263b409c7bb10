//! Metric descriptors and the samples emitted against them.

use std::sync::Arc;

/// Constant label carrying the environment name.
pub const LABEL_ENVIRONMENT: &str = "environment";
/// Constant label carrying the director name.
pub const LABEL_BOSH_NAME: &str = "bosh_name";
/// Constant label carrying the director UUID.
pub const LABEL_BOSH_UUID: &str = "bosh_uuid";

/// Static description of a metric family, independent of any value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDescriptor {
    /// Fully-qualified metric name.
    pub fq_name: String,
    /// Help text.
    pub help: String,
    /// Labels shared by every sample of the family, fixed at construction.
    pub const_labels: Vec<(String, String)>,
    /// Names of the labels whose values vary per sample.
    pub variable_labels: Vec<String>,
}

impl MetricDescriptor {
    /// Create a new descriptor.
    pub fn new(
        fq_name: impl Into<String>,
        help: impl Into<String>,
        const_labels: Vec<(String, String)>,
        variable_labels: &[&str],
    ) -> Self {
        Self {
            fq_name: fq_name.into(),
            help: help.into(),
            const_labels,
            variable_labels: variable_labels.iter().map(|l| l.to_string()).collect(),
        }
    }
}

/// A single gauge reading: one label combination of one family.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// The family this sample belongs to.
    pub descriptor: Arc<MetricDescriptor>,
    /// Values for the descriptor's variable labels, in declaration order.
    pub label_values: Vec<String>,
    /// The gauge value.
    pub value: f64,
}

impl Sample {
    /// The family's metric name.
    pub fn name(&self) -> &str {
        &self.descriptor.fq_name
    }

    /// Look up the value of a variable label by name.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.descriptor
            .variable_labels
            .iter()
            .position(|l| l == name)
            .and_then(|i| self.label_values.get(i))
            .map(String::as_str)
    }

    /// Full label set: constant labels followed by variable labels.
    pub fn labels(&self) -> Vec<(String, String)> {
        let mut labels = self.descriptor.const_labels.clone();
        labels.extend(
            self.descriptor
                .variable_labels
                .iter()
                .cloned()
                .zip(self.label_values.iter().cloned()),
        );
        labels
    }
}

/// Build a fully-qualified metric name.
///
/// Joins the non-empty parts with underscores: `{namespace}_{subsystem}_{name}`.
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// Build the constant label set shared by every family of a collector.
pub fn const_labels(environment: &str, bosh_name: &str, bosh_uuid: &str) -> Vec<(String, String)> {
    vec![
        (LABEL_ENVIRONMENT.to_string(), environment.to_string()),
        (LABEL_BOSH_NAME.to_string(), bosh_name.to_string()),
        (LABEL_BOSH_UUID.to_string(), bosh_uuid.to_string()),
    ]
}

/// Check whether a string is a valid Prometheus metric name.
///
/// Prometheus metric names must match `[a-zA-Z_:][a-zA-Z0-9_:]*`.
pub fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_fq_name() {
        assert_eq!(
            build_fq_name("bosh", "deployment", "release_info"),
            "bosh_deployment_release_info"
        );
        assert_eq!(
            build_fq_name("bosh", "", "last_deployments_scrape_timestamp"),
            "bosh_last_deployments_scrape_timestamp"
        );
        assert_eq!(
            build_fq_name("", "deployment", "instance_count"),
            "deployment_instance_count"
        );
    }

    #[test]
    fn test_is_valid_metric_name() {
        assert!(is_valid_metric_name("bosh"));
        assert!(is_valid_metric_name("_private"));
        assert!(is_valid_metric_name("foo:bar_1"));
        assert!(!is_valid_metric_name(""));
        assert!(!is_valid_metric_name("1bosh"));
        assert!(!is_valid_metric_name("bosh-exporter"));
    }

    #[test]
    fn test_sample_labels() {
        let descriptor = Arc::new(MetricDescriptor::new(
            "bosh_deployment_instance_count",
            "help",
            const_labels("prod", "director", "uuid-1"),
            &["bosh_deployment", "bosh_vm_type"],
        ));
        let sample = Sample {
            descriptor,
            label_values: vec!["cf".to_string(), "small".to_string()],
            value: 3.0,
        };

        assert_eq!(sample.label("bosh_vm_type"), Some("small"));
        assert_eq!(sample.label("environment"), None);

        let labels = sample.labels();
        assert_eq!(labels.len(), 5);
        assert_eq!(labels[0], ("environment".to_string(), "prod".to_string()));
        assert_eq!(labels[4], ("bosh_vm_type".to_string(), "small".to_string()));
    }
}
