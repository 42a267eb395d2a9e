pub mod ids;
pub mod version;

pub use ids::{Anchor, PackageId, RequestId, VersionId, VERSION_BEING_BUILT};
pub use version::{
    parse_major_minor, sort_by_version, BuildKeyword, BuildNumber, VersionError, VersionNumber,
    VersionResult,
};
