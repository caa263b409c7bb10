use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

/// A BOSH deployment as reported by the director.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentInfo {
    /// Deployment name, unique within a snapshot.
    pub name: String,

    /// Releases referenced by the deployment. The same release name may appear
    /// several times with different versions.
    #[serde(default)]
    pub releases: Vec<Release>,

    /// Stemcells used by the deployment.
    #[serde(default)]
    pub stemcells: Vec<Stemcell>,

    /// Instances (VMs) belonging to the deployment.
    #[serde(default)]
    pub instances: Vec<Instance>,
}

impl DeploymentInfo {
    /// Create an empty deployment.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a release to this deployment.
    pub fn with_release(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.releases.push(Release {
            name: name.into(),
            version: version.into(),
        });
        self
    }

    /// Add a stemcell to this deployment.
    pub fn with_stemcell(
        mut self,
        name: impl Into<String>,
        version: impl Into<String>,
        os_name: impl Into<String>,
    ) -> Self {
        self.stemcells.push(Stemcell {
            name: name.into(),
            version: version.into(),
            os_name: os_name.into(),
        });
        self
    }

    /// Add an instance of the given VM type to this deployment.
    pub fn with_instance(mut self, vm_type: impl Into<String>) -> Self {
        self.instances.push(Instance::new(vm_type));
        self
    }
}

/// A versioned release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Release {
    pub name: String,
    pub version: String,
}

/// A versioned stemcell (base OS image).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stemcell {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub os_name: String,
}

/// A deployment instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Instance group name (e.g., "router").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Instance ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Index within the instance group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,

    /// Availability zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub az: Option<String>,

    /// VM type (resource size class) assigned to the instance.
    #[serde(default)]
    pub vm_type: String,
}

impl Instance {
    /// Create an instance with only a VM type set.
    pub fn new(vm_type: impl Into<String>) -> Self {
        Self {
            vm_type: vm_type.into(),
            ..Default::default()
        }
    }
}

/// Parse a deployments snapshot from a JSON array.
pub fn parse_snapshot(content: &str) -> Result<Vec<DeploymentInfo>> {
    let deployments: Vec<DeploymentInfo> = serde_json::from_str(content)?;

    if let Some(unnamed) = deployments.iter().position(|d| d.name.is_empty()) {
        return Err(Error::Snapshot(format!(
            "deployment at index {} has an empty name",
            unnamed
        )));
    }

    Ok(deployments)
}

/// Load a deployments snapshot from a JSON file.
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Vec<DeploymentInfo>> {
    let content = std::fs::read_to_string(path)?;
    parse_snapshot(&content)
}

/// Get the current time as Unix epoch seconds.
pub fn current_timestamp_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
