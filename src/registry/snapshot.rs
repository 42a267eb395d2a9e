use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::anyhow;
use serde::Deserialize;
use tracing::trace;

use crate::core::ids::{PackageId, RequestId, VersionId};
use crate::core::version::VersionNumber;
use crate::error::{LineageError, Result};
use crate::registry::traits::Registry;
use crate::registry::{
    AncestryFact, BuildIdentity, CalculationState, ContainerType, NodeRecord,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub packages: Vec<PackageEntry>,
    #[serde(default)]
    pub versions: Vec<VersionEntry>,
    #[serde(default)]
    pub requests: Vec<RequestEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageEntry {
    pub id: PackageId,
    pub name: String,
    pub container: ContainerType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: VersionId,
    pub package: PackageId,
    pub version: String,
    #[serde(default)]
    pub ancestor: Option<VersionId>,
    #[serde(default = "default_released")]
    pub released: bool,
    #[serde(default)]
    pub dependencies: Vec<VersionId>,
    #[serde(default)]
    pub request: Option<RequestId>,
    #[serde(default)]
    pub record: Option<NodeRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestEntry {
    pub id: RequestId,
    pub package: PackageId,
    pub version: String,
    #[serde(default)]
    pub built_version: Option<VersionId>,
    #[serde(default)]
    pub transitive_complete: bool,
    #[serde(default)]
    pub dependency_graph: Option<String>,
}

fn default_released() -> bool {
    true
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotRegistry {
    packages: HashMap<PackageId, PackageEntry>,
    versions: Vec<VersionEntry>,
    requests: HashMap<RequestId, RequestEntry>,
}

impl SnapshotRegistry {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            packages: snapshot
                .packages
                .into_iter()
                .map(|entry| (entry.id.clone(), entry))
                .collect(),
            versions: snapshot.versions,
            requests: snapshot
                .requests
                .into_iter()
                .map(|entry| (entry.id.clone(), entry))
                .collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&contents).map_err(|err| {
            LineageError::Registry(anyhow!(
                "failed to parse snapshot {}: {}",
                path.display(),
                err
            ))
        })?;
        trace!(
            path = %path.display(),
            packages = snapshot.packages.len(),
            versions = snapshot.versions.len(),
            "loaded registry snapshot"
        );
        Ok(Self::new(snapshot))
    }

    fn version_entry(&self, id: &VersionId) -> Option<&VersionEntry> {
        self.versions.iter().find(|entry| &entry.id == id)
    }

    fn package(&self, id: &PackageId) -> Result<&PackageEntry> {
        self.packages.get(id).ok_or_else(|| {
            LineageError::Registry(anyhow!("package {} is not in the snapshot", id))
        })
    }

    fn fact_for(&self, entry: &VersionEntry) -> Result<AncestryFact> {
        let package = self.package(&entry.package)?;
        Ok(AncestryFact {
            id: entry.id.clone(),
            package_id: entry.package.clone(),
            package_name: package.name.clone(),
            version: VersionNumber::parse(&entry.version)?,
            ancestor_id: entry.ancestor.clone(),
        })
    }
}

impl Registry for SnapshotRegistry {
    fn fetch_version(&self, version: &VersionId) -> Result<Option<AncestryFact>> {
        trace!(%version, "fetch version");
        self.version_entry(version)
            .map(|entry| self.fact_for(entry))
            .transpose()
    }

    fn fetch_children_of(&self, version: &VersionId) -> Result<Vec<AncestryFact>> {
        trace!(%version, "fetch children");
        self.versions
            .iter()
            .filter(|entry| entry.released && entry.ancestor.as_ref() == Some(version))
            .map(|entry| self.fact_for(entry))
            .collect()
    }

    fn fetch_roots_of_package(&self, package: &PackageId) -> Result<Vec<AncestryFact>> {
        trace!(%package, "fetch package roots");
        self.versions
            .iter()
            .filter(|entry| &entry.package == package && entry.released && entry.ancestor.is_none())
            .map(|entry| self.fact_for(entry))
            .collect()
    }

    fn fetch_container_type(&self, id: &str) -> Result<ContainerType> {
        trace!(id, "fetch container type");
        let package_id = match self.version_entry(&VersionId::new(id)) {
            Some(entry) => entry.package.clone(),
            None => PackageId::new(id),
        };
        if let Some(package) = self.packages.get(&package_id) {
            return Ok(package.container);
        }
        Err(LineageError::VersionNotFound(id.to_string()))
    }

    fn fetch_dependency_calculation_state(
        &self,
        request: &RequestId,
    ) -> Result<CalculationState> {
        trace!(%request, "fetch dependency calculation state");
        let entry = self.requests.get(request).ok_or_else(|| {
            LineageError::Registry(anyhow!("create request {} is not in the snapshot", request))
        })?;
        Ok(CalculationState {
            is_complete: entry.transitive_complete,
            graph_description: entry.dependency_graph.clone(),
        })
    }

    fn fetch_flat_dependencies(&self, version: &VersionId) -> Result<Vec<VersionId>> {
        trace!(%version, "fetch flat dependencies");
        self.version_entry(version)
            .map(|entry| entry.dependencies.clone())
            .ok_or_else(|| LineageError::VersionNotFound(version.to_string()))
    }

    fn fetch_version_being_built(&self, request: &RequestId) -> Result<Option<BuildIdentity>> {
        trace!(%request, "fetch version being built");
        let Some(entry) = self.requests.get(request) else {
            return Ok(None);
        };
        let package = self.package(&entry.package)?;
        Ok(Some(BuildIdentity {
            real_id: entry.built_version.clone(),
            package_name: package.name.clone(),
            version: VersionNumber::parse(&entry.version)?,
        }))
    }

    fn fetch_node_record(&self, version: &VersionId) -> Result<NodeRecord> {
        trace!(%version, "fetch node record");
        let entry = self
            .version_entry(version)
            .ok_or_else(|| LineageError::VersionNotFound(version.to_string()))?;
        if let Some(record) = &entry.record {
            return Ok(record.clone());
        }
        let package = self.package(&entry.package)?;
        let parsed = VersionNumber::parse(&entry.version)?;
        Ok(NodeRecord {
            package_name: Some(package.name.clone()),
            major: Some(parsed.major),
            minor: Some(parsed.minor),
            patch: Some(parsed.patch),
            build: Some(parsed.build.to_string()),
        })
    }

    fn fetch_request_for_version(&self, version: &VersionId) -> Result<Option<RequestId>> {
        trace!(%version, "fetch create request for version");
        let entry = self
            .version_entry(version)
            .ok_or_else(|| LineageError::VersionNotFound(version.to_string()))?;
        Ok(entry.request.clone())
    }
}
