// src/engine/backlog.rs

//! Store-side view of outstanding work, used to decide when a run is idle.

use std::collections::HashSet;

use crate::dag::DependencyResolver;
use crate::errors::Result;
use crate::store::TaskStore;
use crate::types::{TaskId, TaskStatus};

/// Outstanding work as recorded in the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Backlog {
    /// Tasks currently `Running`.
    pub running: Vec<TaskId>,
    /// `Queued` tasks whose dependencies are all `Completed`.
    pub runnable: usize,
    /// `Queued` tasks still waiting on a dependency that has not completed.
    /// Once nothing is running these can only move if a dependency is
    /// resubmitted, which never happens in-process.
    pub blocked: Vec<TaskId>,
}

impl Backlog {
    /// Nothing is running and nothing queued can start.
    pub fn is_idle(&self) -> bool {
        self.running.is_empty() && self.runnable == 0
    }

    /// Like [`Backlog::is_idle`], but `Running` records listed in `orphaned`
    /// do not count. A record left `Running` by a process that died is never
    /// picked up again, so waiting on it would never end.
    pub fn is_idle_except(&self, orphaned: &HashSet<TaskId>) -> bool {
        self.runnable == 0 && self.running.iter().all(|id| orphaned.contains(id))
    }
}

/// Read the current backlog from `store`.
pub async fn backlog(store: &dyn TaskStore) -> Result<Backlog> {
    let running = store
        .find_by_status(TaskStatus::Running)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();
    let queued = store.find_by_status(TaskStatus::Queued).await?;

    let mut resolver = DependencyResolver::new();
    resolver.load_completed_tasks(store.find_completed_ids().await?);

    let (runnable, blocked): (Vec<_>, Vec<_>) = queued
        .into_iter()
        .partition(|task| resolver.is_eligible_to_run(task));

    Ok(Backlog {
        running,
        runnable: runnable.len(),
        blocked: blocked.into_iter().map(|t| t.id).collect(),
    })
}
