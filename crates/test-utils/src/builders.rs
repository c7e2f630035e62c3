#![allow(dead_code)]

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use taskgate::config::{ConfigFile, RawConfigFile, TaskConfig};
use taskgate::errors::Result;
use taskgate::types::{NewTask, StartupLoadPolicy, StorageMode, Task, TaskStatus};

/// Builder for store records and creation requests.
///
/// Defaults: type `"test"`, 10 ms, `Queued`, no dependencies.
pub struct TaskBuilder {
    id: String,
    task_type: String,
    duration_ms: u64,
    status: TaskStatus,
    dependencies: Vec<String>,
    created_at: DateTime<Utc>,
}

impl TaskBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            task_type: "test".to_string(),
            duration_ms: 10,
            status: TaskStatus::Queued,
            dependencies: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn task_type(mut self, task_type: &str) -> Self {
        self.task_type = task_type.to_string();
        self
    }

    pub fn duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.dependencies.push(dep.to_string());
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Shift `created_at` by `offset_ms` from now, to control store ordering.
    pub fn created_offset_ms(mut self, offset_ms: i64) -> Self {
        self.created_at = Utc::now() + Duration::milliseconds(offset_ms);
        self
    }

    /// A stored record, as a store would hold it.
    pub fn build(self) -> Task {
        Task {
            id: self.id,
            task_type: self.task_type,
            duration_ms: self.duration_ms,
            status: self.status,
            dependencies: self.dependencies,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }

    /// A creation request for `submit_task`.
    pub fn new_task(self) -> NewTask {
        NewTask {
            id: self.id,
            task_type: self.task_type,
            duration_ms: self.duration_ms,
            dependencies: self.dependencies,
        }
    }
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_task(mut self, id: &str, task: TaskConfig) -> Self {
        self.config.task.insert(id.to_string(), task);
        self
    }

    pub fn max_concurrent_tasks(mut self, n: usize) -> Self {
        self.config.scheduler.max_concurrent_tasks = n;
        self
    }

    pub fn polling_interval_ms(mut self, ms: u64) -> Self {
        self.config.scheduler.polling_interval_ms = ms;
        self
    }

    pub fn startup_load(mut self, policy: StartupLoadPolicy) -> Self {
        self.config.scheduler.startup_load = policy;
        self
    }

    pub fn memory_store(mut self) -> Self {
        self.config.store.mode = StorageMode::Memory;
        self
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(task_type: &str, duration_ms: u64) -> Self {
        Self {
            task: TaskConfig {
                task_type: task_type.to_string(),
                duration_ms,
                after: vec![],
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// Shorthand for a seed task with the given dependencies.
pub fn seed_task(task_type: &str, duration_ms: u64, after: &[&str]) -> TaskConfig {
    after
        .iter()
        .fold(TaskConfigBuilder::new(task_type, duration_ms), |b, dep| {
            b.after(dep)
        })
        .build()
}

/// Shorthand map used by the DAG tests.
pub fn task_map(entries: &[(&str, &[&str])]) -> BTreeMap<String, TaskConfig> {
    entries
        .iter()
        .map(|(id, after)| (id.to_string(), seed_task("test", 10, after)))
        .collect()
}
