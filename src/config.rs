//! Runtime configuration for adapters: where the catalog artifacts live and
//! how loudly to log.

use anyhow::{Result, bail};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable naming the artifact directory.
pub const DATA_DIR_ENV: &str = "PROGRAMME_EXPLORER_DATA";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExplorerConfig {
    pub data_dir: PathBuf,
    pub log_level: String,
}

impl ExplorerConfig {
    /// Resolve the data directory and pick a log level, `warn` when unset.
    pub fn resolve(data_dir: Option<&Path>, log_level: Option<&str>) -> Result<Self> {
        Ok(Self {
            data_dir: resolve_data_dir(data_dir)?,
            log_level: log_level
                .map(str::trim)
                .filter(|level| !level.is_empty())
                .unwrap_or(DEFAULT_LOG_LEVEL)
                .to_string(),
        })
    }
}

/// Pick the artifact directory: an explicit path, then `PROGRAMME_EXPLORER_DATA`,
/// then `./data`. The chosen directory must exist.
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    let env_hint = env::var(DATA_DIR_ENV).ok();
    data_dir_from(explicit, env_hint.as_deref())
}

fn data_dir_from(explicit: Option<&Path>, env_hint: Option<&str>) -> Result<PathBuf> {
    let (candidate, source) = match (explicit, env_hint.map(str::trim)) {
        (Some(path), _) => (path.to_path_buf(), "--data-dir"),
        (None, Some(hint)) if !hint.is_empty() => (PathBuf::from(hint), DATA_DIR_ENV),
        _ => (PathBuf::from(DEFAULT_DATA_DIR), "default"),
    };
    if !candidate.is_dir() {
        bail!(
            "catalog data directory {} ({source}) does not exist",
            candidate.display()
        );
    }
    Ok(candidate)
}
