//! Collector turning deployment snapshots into gauge samples.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use bosh_exporter_common::{DeploymentInfo, current_timestamp_secs};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

use crate::descriptor::{MetricDescriptor, Sample, build_fq_name, const_labels};
use crate::error::CollectError;
use crate::metric::{Gauge, GaugeVec};
use crate::source::DeploymentsSource;

const DEPLOYMENT_SUBSYSTEM: &str = "deployment";

/// Collector statistics.
#[derive(Debug, Clone, Default)]
pub struct CollectorStats {
    /// Successful collection passes.
    pub scrapes: u64,
    /// Passes that failed, either fetching the snapshot or populating a family.
    pub scrape_failures: u64,
    /// Release label combinations seen more than once within a pass.
    pub duplicate_releases: u64,
    /// Stemcell label combinations seen more than once within a pass.
    pub duplicate_stemcells: u64,
    /// Deployments, releases, stemcells or instances left out because a
    /// label value would have been empty.
    pub skipped_records: u64,
    /// Samples emitted by the last successful pass.
    pub last_sample_count: usize,
}

/// The metric containers, guarded together so a pass is never observed half done.
struct Families {
    release_info: GaugeVec,
    stemcell_info: GaugeVec,
    instance_count: GaugeVec,
    last_scrape_timestamp: Gauge,
    last_scrape_duration_seconds: Gauge,
}

impl Families {
    fn collect_into(&self, out: &mut Vec<Sample>) {
        self.release_info.collect_into(out);
        self.stemcell_info.collect_into(out);
        self.instance_count.collect_into(out);
        out.push(self.last_scrape_timestamp.sample());
        out.push(self.last_scrape_duration_seconds.sample());
    }
}

/// Per-deployment families rebuilt from scratch on every pass.
struct Pass {
    release_info: GaugeVec,
    stemcell_info: GaugeVec,
    instance_count: GaugeVec,
    duplicate_releases: u64,
    duplicate_stemcells: u64,
    skipped_records: u64,
}

/// Thread-safe deployments metric collector.
///
/// Owns one container per metric family. The containers live as long as the
/// collector; each pass replaces their contents, never the containers.
pub struct DeploymentsCollector {
    /// Descriptors in emission order, immutable after construction.
    descriptors: Vec<Arc<MetricDescriptor>>,
    families: Mutex<Families>,
    stats: RwLock<CollectorStats>,
}

impl DeploymentsCollector {
    /// Create a collector whose metrics carry the given namespace and constant labels.
    ///
    /// No validation is performed here; an empty namespace simply yields
    /// unprefixed metric names.
    pub fn new(namespace: &str, environment: &str, bosh_name: &str, bosh_uuid: &str) -> Self {
        let labels = const_labels(environment, bosh_name, bosh_uuid);

        let release_info = Arc::new(MetricDescriptor::new(
            build_fq_name(namespace, DEPLOYMENT_SUBSYSTEM, "release_info"),
            "Labeled BOSH Deployment Release Info with a constant '1' value.",
            labels.clone(),
            &["bosh_deployment", "bosh_release_name", "bosh_release_version"],
        ));

        let stemcell_info = Arc::new(MetricDescriptor::new(
            build_fq_name(namespace, DEPLOYMENT_SUBSYSTEM, "stemcell_info"),
            "Labeled BOSH Deployment Stemcell Info with a constant '1' value.",
            labels.clone(),
            &[
                "bosh_deployment",
                "bosh_stemcell_name",
                "bosh_stemcell_version",
                "bosh_stemcell_os_name",
            ],
        ));

        let instance_count = Arc::new(MetricDescriptor::new(
            build_fq_name(namespace, DEPLOYMENT_SUBSYSTEM, "instance_count"),
            "Number of instances in this deployment.",
            labels.clone(),
            &["bosh_deployment", "bosh_vm_type"],
        ));

        let last_scrape_timestamp = Arc::new(MetricDescriptor::new(
            build_fq_name(namespace, "", "last_deployments_scrape_timestamp"),
            "Number of seconds since 1970 since last scrape of Deployments metrics from BOSH.",
            labels.clone(),
            &[],
        ));

        let last_scrape_duration_seconds = Arc::new(MetricDescriptor::new(
            build_fq_name(namespace, "", "last_deployments_scrape_duration_seconds"),
            "Duration of the last scrape of Deployments metrics from BOSH.",
            labels,
            &[],
        ));

        let families = Families {
            release_info: GaugeVec::new(release_info.clone()),
            stemcell_info: GaugeVec::new(stemcell_info.clone()),
            instance_count: GaugeVec::new(instance_count.clone()),
            last_scrape_timestamp: Gauge::new(last_scrape_timestamp.clone()),
            last_scrape_duration_seconds: Gauge::new(last_scrape_duration_seconds.clone()),
        };

        Self {
            descriptors: vec![
                release_info,
                stemcell_info,
                instance_count,
                last_scrape_timestamp,
                last_scrape_duration_seconds,
            ],
            families: Mutex::new(families),
            stats: RwLock::new(CollectorStats::default()),
        }
    }

    /// Descriptors of every family this collector emits.
    pub fn describe(&self) -> Vec<Arc<MetricDescriptor>> {
        self.descriptors.clone()
    }

    /// Run a collection pass over a snapshot and return every resulting sample.
    ///
    /// Deployment-scoped families end up holding exactly the label combinations
    /// of `deployments`. If the pass fails, the previous values are kept.
    pub fn collect(&self, deployments: &[DeploymentInfo]) -> Result<Vec<Sample>, CollectError> {
        let begun = Instant::now();

        // Held for the whole pass: concurrent scrapes are serialized and readers
        // never see a reset family that is not yet repopulated.
        let mut families = self.families.lock();

        let pass = match self.populate(&families, deployments) {
            Ok(pass) => pass,
            Err(e) => {
                self.stats.write().scrape_failures += 1;
                warn!(error = %e, "Deployments collection failed, keeping previous values");
                return Err(e);
            }
        };

        families.release_info = pass.release_info;
        families.stemcell_info = pass.stemcell_info;
        families.instance_count = pass.instance_count;

        let mut samples = Vec::with_capacity(
            families.release_info.len()
                + families.stemcell_info.len()
                + families.instance_count.len()
                + 2,
        );
        families.release_info.collect_into(&mut samples);
        families.stemcell_info.collect_into(&mut samples);
        families.instance_count.collect_into(&mut samples);

        families
            .last_scrape_timestamp
            .set(current_timestamp_secs() as f64);
        samples.push(families.last_scrape_timestamp.sample());

        let duration = begun.elapsed().as_secs_f64();
        families.last_scrape_duration_seconds.set(duration);
        samples.push(families.last_scrape_duration_seconds.sample());

        drop(families);

        {
            let mut stats = self.stats.write();
            stats.scrapes += 1;
            stats.duplicate_releases += pass.duplicate_releases;
            stats.duplicate_stemcells += pass.duplicate_stemcells;
            stats.skipped_records += pass.skipped_records;
            stats.last_sample_count = samples.len();
        }

        debug!(
            deployments = deployments.len(),
            samples = samples.len(),
            duration_secs = duration,
            "Collected deployments metrics"
        );

        Ok(samples)
    }

    /// Fetch a snapshot from `source` and run a collection pass over it.
    ///
    /// A source failure is returned unchanged as [`CollectError::SnapshotUnavailable`]
    /// and leaves every metric untouched.
    pub fn collect_from<S: DeploymentsSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<Vec<Sample>, CollectError> {
        let deployments = match source.deployments() {
            Ok(deployments) => deployments,
            Err(e) => {
                self.stats.write().scrape_failures += 1;
                warn!(error = %e, "Failed to fetch deployments snapshot");
                return Err(CollectError::SnapshotUnavailable(e));
            }
        };

        self.collect(&deployments)
    }

    /// Samples currently stored, without running a pass.
    pub fn samples(&self) -> Vec<Sample> {
        let families = self.families.lock();
        let mut samples = Vec::new();
        families.collect_into(&mut samples);
        samples
    }

    /// Get collector statistics.
    pub fn stats(&self) -> CollectorStats {
        self.stats.read().clone()
    }

    fn populate(
        &self,
        families: &Families,
        deployments: &[DeploymentInfo],
    ) -> Result<Pass, CollectError> {
        let mut pass = Pass {
            release_info: families.release_info.empty_like(),
            stemcell_info: families.stemcell_info.empty_like(),
            instance_count: families.instance_count.empty_like(),
            duplicate_releases: 0,
            duplicate_stemcells: 0,
            skipped_records: 0,
        };

        for deployment in deployments {
            if deployment.name.is_empty() {
                pass.skipped_records += 1;
                debug!("Skipping deployment with empty name");
                continue;
            }

            let releases = report_release_info(&mut pass.release_info, deployment)?;
            let stemcells = report_stemcell_info(&mut pass.stemcell_info, deployment)?;
            let instances = report_instance_count(&mut pass.instance_count, deployment)?;

            pass.duplicate_releases += releases.duplicates;
            pass.duplicate_stemcells += stemcells.duplicates;
            pass.skipped_records += releases.skipped + stemcells.skipped + instances.skipped;
        }

        Ok(pass)
    }
}

/// Create a shareable collector handle.
pub type SharedCollector = Arc<DeploymentsCollector>;

/// Outcome of reporting one family for one deployment.
#[derive(Debug, Default)]
struct Report {
    duplicates: u64,
    skipped: u64,
}

fn has_empty_value(label_values: &[&str]) -> bool {
    label_values.iter().any(|v| v.is_empty())
}

fn report_release_info(
    family: &mut GaugeVec,
    deployment: &DeploymentInfo,
) -> Result<Report, CollectError> {
    let mut report = Report::default();
    for release in &deployment.releases {
        let label_values = [
            deployment.name.as_str(),
            release.name.as_str(),
            release.version.as_str(),
        ];
        if has_empty_value(&label_values) {
            report.skipped += 1;
            debug!(
                deployment = %deployment.name,
                release = %release.name,
                version = %release.version,
                "Skipping release with empty name or version"
            );
            continue;
        }

        if family.set(&label_values, 1.0)? {
            report.duplicates += 1;
            debug!(
                deployment = %deployment.name,
                release = %release.name,
                version = %release.version,
                "Duplicate release in snapshot"
            );
        }
    }
    Ok(report)
}

fn report_stemcell_info(
    family: &mut GaugeVec,
    deployment: &DeploymentInfo,
) -> Result<Report, CollectError> {
    let mut report = Report::default();
    for stemcell in &deployment.stemcells {
        let label_values = [
            deployment.name.as_str(),
            stemcell.name.as_str(),
            stemcell.version.as_str(),
            stemcell.os_name.as_str(),
        ];
        if has_empty_value(&label_values) {
            report.skipped += 1;
            debug!(
                deployment = %deployment.name,
                stemcell = %stemcell.name,
                version = %stemcell.version,
                os_name = %stemcell.os_name,
                "Skipping stemcell with empty name, version or OS"
            );
            continue;
        }

        if family.set(&label_values, 1.0)? {
            report.duplicates += 1;
            debug!(
                deployment = %deployment.name,
                stemcell = %stemcell.name,
                version = %stemcell.version,
                "Duplicate stemcell in snapshot"
            );
        }
    }
    Ok(report)
}

fn report_instance_count(
    family: &mut GaugeVec,
    deployment: &DeploymentInfo,
) -> Result<Report, CollectError> {
    let mut report = Report::default();
    let mut vm_type_count: HashMap<&str, u64> = HashMap::new();
    for instance in &deployment.instances {
        if instance.vm_type.is_empty() {
            report.skipped += 1;
            debug!(
                deployment = %deployment.name,
                instance = instance.name.as_deref().unwrap_or_default(),
                "Skipping instance without VM type"
            );
            continue;
        }
        *vm_type_count.entry(instance.vm_type.as_str()).or_default() += 1;
    }

    for (vm_type, count) in vm_type_count {
        trace!(deployment = %deployment.name, vm_type, count, "Instance count");
        family.set(&[deployment.name.as_str(), vm_type], count as f64)?;
    }
    Ok(report)
}
