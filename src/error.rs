use thiserror::Error;

use crate::config::ConfigError;
use crate::core::version::VersionError;

#[derive(Debug, Error)]
pub enum LineageError {
    #[error("unsupported identifier '{0}': expected a package (0Ho), version (04t) or version create request (08c) id")]
    UnsupportedIdentifier(String),
    #[error("package {0} is not a managed package; ancestry is only tracked for managed packages")]
    UnlockedPackage(String),
    #[error("no released versions without an ancestor were found for package {0}")]
    NoVersions(String),
    #[error("version {0} was not found")]
    VersionNotFound(String),
    #[error("invalid dependency graph: {0}")]
    InvalidDependencyGraph(String),
    #[error("transitive dependencies for {0} have not been calculated yet")]
    TransitiveDependenciesRequired(String),
    #[error(transparent)]
    Version(#[from] VersionError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("registry error: {0}")]
    Registry(#[source] anyhow::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, LineageError>;
