//! Producers of deployments snapshots.

use std::path::PathBuf;

use bosh_exporter_common::{DeploymentInfo, load_snapshot};
use parking_lot::RwLock;
use tracing::trace;

use crate::config::FilterConfig;
use crate::error::SourceError;

/// Something that can produce the current list of deployments on demand.
pub trait DeploymentsSource: Send + Sync {
    /// Fetch a fresh snapshot.
    fn deployments(&self) -> Result<Vec<DeploymentInfo>, SourceError>;
}

/// A source serving an in-memory snapshot.
#[derive(Debug, Default)]
pub struct StaticSource {
    deployments: RwLock<Vec<DeploymentInfo>>,
}

impl StaticSource {
    pub fn new(deployments: Vec<DeploymentInfo>) -> Self {
        Self {
            deployments: RwLock::new(deployments),
        }
    }

    /// Replace the snapshot served by later fetches.
    pub fn replace(&self, deployments: Vec<DeploymentInfo>) {
        *self.deployments.write() = deployments;
    }
}

impl DeploymentsSource for StaticSource {
    fn deployments(&self) -> Result<Vec<DeploymentInfo>, SourceError> {
        Ok(self.deployments.read().clone())
    }
}

/// A source reading a JSON snapshot file on every fetch.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DeploymentsSource for FileSource {
    fn deployments(&self) -> Result<Vec<DeploymentInfo>, SourceError> {
        let deployments = load_snapshot(&self.path).map_err(|e| SourceError::Read {
            path: self.path.display().to_string(),
            source: e,
        })?;

        trace!(
            path = %self.path.display(),
            deployments = deployments.len(),
            "Loaded deployments snapshot"
        );

        Ok(deployments)
    }
}

/// Filter on deployment names.
pub struct DeploymentFilter {
    include: Vec<glob::Pattern>,
    exclude: Vec<glob::Pattern>,
}

impl DeploymentFilter {
    /// Create a new filter from configuration.
    ///
    /// Patterns are expected to have been validated with the configuration;
    /// invalid ones are skipped here.
    pub fn new(config: &FilterConfig) -> Self {
        let include = config
            .include_deployments
            .iter()
            .filter_map(|p| glob::Pattern::new(p).ok())
            .collect();

        let exclude = config
            .exclude_deployments
            .iter()
            .filter_map(|p| glob::Pattern::new(p).ok())
            .collect();

        Self { include, exclude }
    }

    /// Check if a deployment should be included.
    pub fn should_include(&self, deployment: &DeploymentInfo) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|p| p.matches(&deployment.name)) {
            return false;
        }

        !self.exclude.iter().any(|p| p.matches(&deployment.name))
    }

    /// Whether the filter lets everything through.
    pub fn is_pass_through(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

impl Default for DeploymentFilter {
    fn default() -> Self {
        Self::new(&FilterConfig::default())
    }
}

/// A source dropping deployments rejected by a [`DeploymentFilter`].
pub struct FilteredSource<S> {
    inner: S,
    filter: DeploymentFilter,
}

impl<S: DeploymentsSource> FilteredSource<S> {
    pub fn new(inner: S, filter: DeploymentFilter) -> Self {
        Self { inner, filter }
    }
}

impl<S: DeploymentsSource> DeploymentsSource for FilteredSource<S> {
    fn deployments(&self) -> Result<Vec<DeploymentInfo>, SourceError> {
        let mut deployments = self.inner.deployments()?;
        if self.filter.is_pass_through() {
            return Ok(deployments);
        }

        let before = deployments.len();
        deployments.retain(|d| self.filter.should_include(d));

        trace!(
            kept = deployments.len(),
            filtered = before - deployments.len(),
            "Filtered deployments"
        );

        Ok(deployments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn names(deployments: &[DeploymentInfo]) -> Vec<&str> {
        deployments.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_static_source_replace() {
        let source = StaticSource::new(vec![DeploymentInfo::new("a")]);
        assert_eq!(names(&source.deployments().unwrap()), vec!["a"]);

        source.replace(vec![DeploymentInfo::new("b"), DeploymentInfo::new("c")]);
        assert_eq!(names(&source.deployments().unwrap()), vec!["b", "c"]);
    }

    #[test]
    fn test_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"name": "cf", "instances": [{{"vm_type": "small"}}]}}]"#
        )
        .unwrap();

        let source = FileSource::new(file.path());
        let deployments = source.deployments().unwrap();

        assert_eq!(names(&deployments), vec!["cf"]);
        assert_eq!(deployments[0].instances[0].vm_type, "small");
    }

    #[test]
    fn test_file_source_missing_file() {
        let source = FileSource::new("/nonexistent/deployments.json");
        let err = source.deployments().unwrap_err();

        assert!(matches!(err, SourceError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/deployments.json"));
    }

    #[test]
    fn test_file_source_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let source = FileSource::new(file.path());
        assert!(source.deployments().is_err());
    }

    #[test]
    fn test_filter_include() {
        let config = FilterConfig {
            include_deployments: vec!["cf*".to_string()],
            ..Default::default()
        };
        let filter = DeploymentFilter::new(&config);

        assert!(filter.should_include(&DeploymentInfo::new("cf")));
        assert!(filter.should_include(&DeploymentInfo::new("cf-mysql")));
        assert!(!filter.should_include(&DeploymentInfo::new("redis")));
    }

    #[test]
    fn test_filter_exclude_wins() {
        let config = FilterConfig {
            include_deployments: vec!["cf*".to_string()],
            exclude_deployments: vec!["cf-mysql".to_string()],
        };
        let filter = DeploymentFilter::new(&config);

        assert!(filter.should_include(&DeploymentInfo::new("cf")));
        assert!(!filter.should_include(&DeploymentInfo::new("cf-mysql")));
    }

    #[test]
    fn test_filter_default_passes_everything() {
        let filter = DeploymentFilter::default();

        assert!(filter.is_pass_through());
        assert!(filter.should_include(&DeploymentInfo::new("anything")));
    }

    #[test]
    fn test_filtered_source() {
        let inner = StaticSource::new(vec![
            DeploymentInfo::new("cf"),
            DeploymentInfo::new("redis"),
            DeploymentInfo::new("concourse"),
        ]);
        let config = FilterConfig {
            exclude_deployments: vec!["redis".to_string()],
            ..Default::default()
        };
        let source = FilteredSource::new(inner, DeploymentFilter::new(&config));

        assert_eq!(
            names(&source.deployments().unwrap()),
            vec!["cf", "concourse"]
        );
    }
}
