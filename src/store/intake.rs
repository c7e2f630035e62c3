// src/store/intake.rs

//! Validated task creation.
//!
//! This is the only path that creates records. Validation errors surface to
//! the caller here and never reach the scheduler.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::config::model::ConfigFile;
use crate::dag::DependencyGraph;
use crate::errors::{Result, TaskgateError};
use crate::store::TaskStore;
use crate::types::{NewTask, Task, TaskId};

/// Validate `new` against the store and insert it as a `Queued` task.
///
/// Rejects:
/// - an empty id or type tag
/// - a zero duration
/// - a task listing itself (or the same id twice) as a dependency
/// - an id that already exists
/// - dependencies that do not exist in the store
pub async fn submit_task<S>(store: &S, new: NewTask) -> Result<Task>
where
    S: TaskStore + ?Sized,
{
    validate_fields(&new)?;

    if store.get(&new.id).await?.is_some() {
        return Err(TaskgateError::Validation(format!(
            "task '{}' already exists",
            new.id
        )));
    }

    if !new.dependencies.is_empty() {
        let found: HashSet<TaskId> = store
            .find_by_ids(&new.dependencies)
            .await?
            .into_iter()
            .collect();
        let missing: Vec<&str> = new
            .dependencies
            .iter()
            .filter(|dep| !found.contains(dep.as_str()))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(TaskgateError::Validation(format!(
                "task '{}' has unknown dependencies: {}",
                new.id,
                missing.join(", ")
            )));
        }
    }

    let task = Task::queued(new);
    store.insert(task.clone()).await?;
    info!(
        task = %task.id,
        task_type = %task.task_type,
        deps = ?task.dependencies,
        "task queued"
    );
    Ok(task)
}

fn validate_fields(new: &NewTask) -> Result<()> {
    if new.id.trim().is_empty() {
        return Err(TaskgateError::Validation("task id is required".to_string()));
    }
    if new.task_type.trim().is_empty() {
        return Err(TaskgateError::Validation(format!(
            "task '{}' is missing a type",
            new.id
        )));
    }
    if new.duration_ms == 0 {
        return Err(TaskgateError::Validation(format!(
            "task '{}' must have a positive duration",
            new.id
        )));
    }

    let mut seen = HashSet::new();
    for dep in &new.dependencies {
        if dep == &new.id {
            return Err(TaskgateError::Validation(format!(
                "task '{}' cannot depend on itself",
                new.id
            )));
        }
        if !seen.insert(dep.as_str()) {
            return Err(TaskgateError::Validation(format!(
                "task '{}' lists dependency '{}' more than once",
                new.id, dep
            )));
        }
    }
    Ok(())
}

/// Submit the `[task.<id>]` sections of `cfg`, dependencies first.
///
/// Ids already present in the store are left untouched, so restarting with
/// the same config does not duplicate work. Returns how many tasks were
/// newly queued.
pub async fn seed_from_config<S>(store: &S, cfg: &ConfigFile) -> Result<usize>
where
    S: TaskStore + ?Sized,
{
    let graph = DependencyGraph::from_tasks(&cfg.task);
    let mut queued = 0;

    for id in graph.topological_order()? {
        if store.get(&id).await?.is_some() {
            debug!(task = %id, "seed task already in store; skipping");
            continue;
        }

        let Some(tc) = cfg.task.get(&id) else {
            continue;
        };

        submit_task(
            store,
            NewTask {
                id: id.clone(),
                task_type: tc.task_type.clone(),
                duration_ms: tc.duration_ms,
                dependencies: tc.after.clone(),
            },
        )
        .await?;
        queued += 1;
    }

    Ok(queued)
}
