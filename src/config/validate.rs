// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::dag::DependencyGraph;
use crate::errors::{Result, TaskgateError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::TaskgateError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.scheduler, raw.store, raw.task))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_scheduler_section(cfg)?;
    validate_store_section(cfg)?;
    validate_tasks(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn validate_scheduler_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.scheduler.max_concurrent_tasks == 0 {
        return Err(TaskgateError::ConfigError(
            "[scheduler].max_concurrent_tasks must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.scheduler.polling_interval_ms == 0 {
        return Err(TaskgateError::ConfigError(
            "[scheduler].polling_interval_ms must be > 0 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_store_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.store.path.as_os_str().is_empty() {
        return Err(TaskgateError::ConfigError(
            "[store].path must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    for (id, task) in cfg.task.iter() {
        if id.trim().is_empty() {
            return Err(TaskgateError::ConfigError(
                "task ids must not be empty".to_string(),
            ));
        }
        if task.task_type.trim().is_empty() {
            return Err(TaskgateError::ConfigError(format!(
                "task '{}' is missing a `type`",
                id
            )));
        }
        if task.duration_ms == 0 {
            return Err(TaskgateError::ConfigError(format!(
                "task '{}' must have a positive `duration_ms` (got 0)",
                id
            )));
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    let graph = DependencyGraph::from_tasks(&cfg.task);
    graph.check_references()?;
    // A topological sort fails if there is a cycle.
    graph.topological_order().map(|_| ())
}
