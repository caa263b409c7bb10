//! Gauge containers holding the current value of each label combination.

use std::collections::HashMap;
use std::sync::Arc;

use crate::descriptor::{MetricDescriptor, Sample};
use crate::error::CollectError;

/// A gauge family partitioned by variable label values.
#[derive(Debug, Clone)]
pub struct GaugeVec {
    descriptor: Arc<MetricDescriptor>,
    values: HashMap<Vec<String>, f64>,
}

impl GaugeVec {
    /// Create an empty family.
    pub fn new(descriptor: Arc<MetricDescriptor>) -> Self {
        Self {
            descriptor,
            values: HashMap::new(),
        }
    }

    /// Create an empty family sharing this family's descriptor.
    pub fn empty_like(&self) -> Self {
        Self::new(self.descriptor.clone())
    }

    /// Set the value for a label combination.
    ///
    /// Returns `true` if the combination already existed and was overwritten.
    pub fn set(&mut self, label_values: &[&str], value: f64) -> Result<bool, CollectError> {
        let expected = self.descriptor.variable_labels.len();
        if label_values.len() != expected {
            return Err(CollectError::InconsistentLabels {
                metric: self.descriptor.fq_name.clone(),
                expected,
                actual: label_values.len(),
            });
        }

        let key = label_values.iter().map(|v| v.to_string()).collect();
        Ok(self.values.insert(key, value).is_some())
    }

    /// Number of stored label combinations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Append one sample per stored label combination.
    pub fn collect_into(&self, out: &mut Vec<Sample>) {
        out.extend(self.values.iter().map(|(labels, value)| Sample {
            descriptor: self.descriptor.clone(),
            label_values: labels.clone(),
            value: *value,
        }));
    }
}

/// A gauge without variable labels.
#[derive(Debug, Clone)]
pub struct Gauge {
    descriptor: Arc<MetricDescriptor>,
    value: f64,
}

impl Gauge {
    pub fn new(descriptor: Arc<MetricDescriptor>) -> Self {
        Self {
            descriptor,
            value: 0.0,
        }
    }

    pub fn set(&mut self, value: f64) {
        self.value = value;
    }

    /// Build the single sample of this gauge.
    pub fn sample(&self) -> Sample {
        Sample {
            descriptor: self.descriptor.clone(),
            label_values: Vec::new(),
            value: self.value,
        }
    }
}
