use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{ConfigError, LineageConfig, CONFIG_FILE_NAME};

#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub path: Option<PathBuf>,
    pub config: LineageConfig,
}

impl ResolvedConfig {
    pub fn snapshot_path(&self, flag: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
        flag.or_else(|| self.config.registry.snapshot.clone())
            .ok_or(ConfigError::SnapshotNotConfigured)
    }
}

pub fn resolve_config(
    start: impl AsRef<Path>,
    config_path: Option<PathBuf>,
) -> Result<ResolvedConfig, ConfigError> {
    let path = match config_path {
        Some(path) => Some(require_file(path)?),
        None => match env::var("LINEAGE_CONFIG") {
            Ok(path) => Some(require_file(PathBuf::from(path))?),
            Err(_) => find_config_from(start.as_ref()),
        },
    };

    let mut config = match &path {
        Some(path) => load_config(path)?,
        None => LineageConfig::default(),
    };
    apply_env_overrides(&mut config)?;
    debug!(path = ?path, "resolved configuration");

    Ok(ResolvedConfig { path, config })
}

pub fn load_config(path: &Path) -> Result<LineageConfig, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(path)?;
    let mut config: LineageConfig =
        toml::from_str(&contents).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;

    if let Some(snapshot) = config.registry.snapshot.take() {
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.registry.snapshot = Some(if snapshot.is_absolute() {
            snapshot
        } else {
            base.join(snapshot)
        });
    }
    if config.build.jobs == Some(0) {
        return Err(ConfigError::InvalidValue {
            key: "build.jobs".to_string(),
            value: "0".to_string(),
        });
    }

    Ok(config)
}

fn apply_env_overrides(config: &mut LineageConfig) -> Result<(), ConfigError> {
    if let Ok(snapshot) = env::var("LINEAGE_SNAPSHOT") {
        config.registry.snapshot = Some(PathBuf::from(snapshot));
    }
    if let Ok(jobs) = env::var("LINEAGE_JOBS") {
        let parsed = jobs
            .parse::<usize>()
            .ok()
            .filter(|count| *count > 0)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "LINEAGE_JOBS".to_string(),
                value: jobs.clone(),
            })?;
        config.build.jobs = Some(parsed);
    }
    Ok(())
}

fn require_file(path: PathBuf) -> Result<PathBuf, ConfigError> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(ConfigError::ConfigNotFound(path))
    }
}

fn find_config_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}
