// src/dag/resolver.rs

//! Completed-set bookkeeping and per-task eligibility.

use std::collections::HashSet;

use tracing::debug;

use crate::types::{Task, TaskId, TaskStatus};

/// Tracks which task ids are known to have reached `Completed` and answers
/// "may this task run now?".
///
/// The completed-set is append-only while the scheduler runs. It is rebuilt
/// from the store on every `Scheduler::start`.
#[derive(Debug, Default)]
pub struct DependencyResolver {
    completed: HashSet<TaskId>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self {
            completed: HashSet::new(),
        }
    }

    /// Record that `id` has completed. Registering the same id twice is a
    /// no-op.
    pub fn register_completed_task(&mut self, id: &str) {
        if self.completed.insert(id.to_string()) {
            debug!(task = %id, "registered completed task");
        }
    }

    /// Bulk-register ids loaded from the store at startup.
    pub fn load_completed_tasks<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskId>,
    {
        let before = self.completed.len();
        self.completed.extend(ids.into_iter().map(Into::into));
        debug!(
            loaded = self.completed.len() - before,
            total = self.completed.len(),
            "loaded completed tasks"
        );
    }

    /// Whether `task` may be admitted right now.
    ///
    /// Only `Running` and `Completed` are excluded by status. A `Failed` task
    /// whose dependencies are satisfied reports `true` here; the scheduler
    /// never offers such tasks because it only queries `Queued` ones.
    pub fn is_eligible_to_run(&self, task: &Task) -> bool {
        if matches!(task.status, TaskStatus::Running | TaskStatus::Completed) {
            return false;
        }

        task.dependencies
            .iter()
            .all(|dep| self.completed.contains(dep))
    }

    /// Filter `tasks` down to the eligible ones, keeping their order.
    pub fn eligible_tasks(&self, tasks: &[Task]) -> Vec<Task> {
        tasks
            .iter()
            .filter(|task| self.is_eligible_to_run(task))
            .cloned()
            .collect()
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.completed.contains(id)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Forget every completed id.
    pub fn reset(&mut self) {
        self.completed.clear();
    }
}
