// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::types::{StartupLoadPolicy, StorageMode, TaskId};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [scheduler]
/// max_concurrent_tasks = 4
/// polling_interval_ms = 500
///
/// [store]
/// mode = "file"
/// path = ".taskgate/tasks.json"
///
/// [task.build]
/// type = "compile"
/// duration_ms = 200
///
/// [task.test]
/// type = "test"
/// duration_ms = 100
/// after = ["build"]
/// ```
///
/// All sections are optional and have reasonable defaults. This is the
/// unvalidated form; convert it with `ConfigFile::try_from`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub scheduler: SchedulerSection,

    #[serde(default)]
    pub store: StoreSection,

    /// Tasks seeded into the store at startup, keyed by task id.
    #[serde(default)]
    pub task: BTreeMap<TaskId, TaskConfig>,
}

/// A validated configuration. Only obtainable through
/// `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub scheduler: SchedulerSection,
    pub store: StoreSection,
    pub task: BTreeMap<TaskId, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        scheduler: SchedulerSection,
        store: StoreSection,
        task: BTreeMap<TaskId, TaskConfig>,
    ) -> Self {
        Self {
            scheduler,
            store,
            task,
        }
    }
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSection {
    /// Upper bound on tasks executing at the same time.
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,

    /// Delay between two regular poll ticks.
    #[serde(default = "default_polling_interval_ms")]
    pub polling_interval_ms: u64,

    /// Behaviour when completed ids cannot be loaded at startup.
    #[serde(default)]
    pub startup_load: StartupLoadPolicy,
}

fn default_max_concurrent_tasks() -> usize {
    4
}

fn default_polling_interval_ms() -> u64 {
    1000
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: default_max_concurrent_tasks(),
            polling_interval_ms: default_polling_interval_ms(),
            startup_load: StartupLoadPolicy::default(),
        }
    }
}

/// `[store]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub mode: StorageMode,

    /// Snapshot file used when `mode = "file"`. Relative paths are resolved
    /// against the config file's directory.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

/// Relative path of the default snapshot file.
pub const DEFAULT_STORE_PATH: &str = ".taskgate/tasks.json";

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            mode: StorageMode::default(),
            path: default_store_path(),
        }
    }
}

/// `[task.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Type tag handed to the task runner.
    #[serde(rename = "type")]
    pub task_type: String,

    /// Expected run time in milliseconds; must be positive.
    pub duration_ms: u64,

    /// Dependency list: this task waits for all tasks listed here.
    #[serde(default)]
    pub after: Vec<TaskId>,
}
