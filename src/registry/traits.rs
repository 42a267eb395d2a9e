use crate::core::ids::{PackageId, RequestId, VersionId};
use crate::error::Result;
use crate::registry::{AncestryFact, BuildIdentity, CalculationState, ContainerType, NodeRecord};

/// Source of relationship facts for the graph builders.
///
/// Implementations own transport concerns (querying, paging, retries). Errors
/// they return are passed through the builders unchanged.
pub trait Registry: Send + Sync {
    fn fetch_version(&self, version: &VersionId) -> Result<Option<AncestryFact>>;

    fn fetch_children_of(&self, version: &VersionId) -> Result<Vec<AncestryFact>>;

    fn fetch_roots_of_package(&self, package: &PackageId) -> Result<Vec<AncestryFact>>;

    fn fetch_container_type(&self, id: &str) -> Result<ContainerType>;

    fn fetch_dependency_calculation_state(&self, request: &RequestId)
        -> Result<CalculationState>;

    fn fetch_flat_dependencies(&self, version: &VersionId) -> Result<Vec<VersionId>>;

    fn fetch_version_being_built(&self, request: &RequestId) -> Result<Option<BuildIdentity>>;

    fn fetch_node_record(&self, version: &VersionId) -> Result<NodeRecord>;

    fn fetch_request_for_version(&self, version: &VersionId) -> Result<Option<RequestId>>;
}
