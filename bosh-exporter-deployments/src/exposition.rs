//! Text exposition of collected samples through `prometheus-client`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use tracing::warn;

use crate::collector::SharedCollector;
use crate::descriptor::{MetricDescriptor, Sample};
use crate::error::CollectError;
use crate::source::DeploymentsSource;

type GaugeFamily = Family<Vec<(String, String)>, Gauge<f64, AtomicU64>>;

/// Encode samples in the text exposition format.
///
/// Every descriptor is registered, so families without samples still show up
/// with their HELP and TYPE lines. Samples whose family is not described are
/// dropped.
pub fn render(
    descriptors: &[Arc<MetricDescriptor>],
    samples: &[Sample],
) -> Result<String, std::fmt::Error> {
    let mut registry = Registry::default();
    let mut families: HashMap<&str, GaugeFamily> = HashMap::with_capacity(descriptors.len());

    for descriptor in descriptors {
        let family = GaugeFamily::default();
        // The registry terminates help text with a period itself.
        let help = descriptor.help.trim_end_matches('.');
        registry.register(descriptor.fq_name.as_str(), help, family.clone());
        families.insert(descriptor.fq_name.as_str(), family);
    }

    for sample in samples {
        match families.get(sample.name()) {
            Some(family) => {
                let labels: Vec<(String, String)> = sample
                    .labels()
                    .into_iter()
                    .map(|(name, value)| (name, escape_label_value(&value)))
                    .collect();
                family.get_or_create(&labels).set(sample.value);
            }
            None => {
                warn!(metric = %sample.name(), "Dropping sample of undescribed metric");
            }
        }
    }

    let mut buffer = String::new();
    encode(&mut buffer, &registry)?;
    Ok(buffer)
}

/// Escape special characters in label values.
///
/// The text encoder writes label values verbatim.
fn escape_label_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            _ => result.push(c),
        }
    }
    result
}

/// Pairs a collector with the source it scrapes.
pub struct Exporter<S> {
    collector: SharedCollector,
    source: S,
}

impl<S: DeploymentsSource> Exporter<S> {
    pub fn new(collector: SharedCollector, source: S) -> Self {
        Self { collector, source }
    }

    pub fn collector(&self) -> &SharedCollector {
        &self.collector
    }

    /// Run one scrape and render the result.
    ///
    /// When the snapshot cannot be fetched, the values from the last successful
    /// scrape are rendered instead.
    pub fn scrape(&self) -> Result<String, std::fmt::Error> {
        let samples = match self.collector.collect_from(&self.source) {
            Ok(samples) => samples,
            Err(CollectError::SnapshotUnavailable(e)) => {
                warn!(error = %e, "Serving previous deployments metrics");
                self.collector.samples()
            }
            Err(e) => {
                warn!(error = %e, "Collection failed, serving previous deployments metrics");
                self.collector.samples()
            }
        };

        render(&self.collector.describe(), &samples)
    }
}
