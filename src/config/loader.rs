// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "Taskgate.toml";

/// Read `path` and deserialize it into a [`RawConfigFile`].
///
/// Defaults are filled in by `serde`; nothing is validated yet.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    debug!(path = ?path, bytes = contents.len(), "read config file");
    Ok(toml::from_str(&contents)?)
}

/// Parse and validate TOML text.
pub fn parse_config(contents: &str) -> Result<ConfigFile> {
    let raw: RawConfigFile = toml::from_str(contents)?;
    ConfigFile::try_from(raw)
}

/// [`load_from_path`] followed by validation: scheduler limits, store path,
/// seed task fields, `after` references and dependency cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let cfg = ConfigFile::try_from(load_from_path(&path)?)?;
    debug!(
        tasks = cfg.task.len(),
        max_concurrent_tasks = cfg.scheduler.max_concurrent_tasks,
        "config validated"
    );
    Ok(cfg)
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}
