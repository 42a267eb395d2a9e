pub mod resolve;

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::graph::dependency::EdgeDirection;

pub const CONFIG_FILE_NAME: &str = "lineage.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineageConfig {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildConfig {
    #[serde(default)]
    pub jobs: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub edge_direction: EdgeDirection,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),
    #[error("no registry snapshot configured; pass --snapshot or set registry.snapshot")]
    SnapshotNotConfigured,
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config at {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
