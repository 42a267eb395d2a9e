use serde::{Deserialize, Serialize};

use crate::core::ids::{PackageId, VersionId};
use crate::core::version::VersionNumber;

pub mod snapshot;
pub mod traits;

pub use snapshot::SnapshotRegistry;
pub use traits::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerType {
    Managed,
    Unlocked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestryFact {
    pub id: VersionId,
    pub package_id: PackageId,
    pub package_name: String,
    pub version: VersionNumber,
    pub ancestor_id: Option<VersionId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculationState {
    pub is_complete: bool,
    pub graph_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildIdentity {
    pub real_id: Option<VersionId>,
    pub package_name: String,
    pub version: VersionNumber,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NodeRecord {
    #[serde(rename = "PackageName", default)]
    pub package_name: Option<String>,
    #[serde(rename = "MajorVersion", default)]
    pub major: Option<u32>,
    #[serde(rename = "MinorVersion", default)]
    pub minor: Option<u32>,
    #[serde(rename = "PatchVersion", default)]
    pub patch: Option<u32>,
    #[serde(rename = "BuildNumber", default)]
    pub build: Option<String>,
}
