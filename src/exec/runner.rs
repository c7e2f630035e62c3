// src/exec/runner.rs

//! Pluggable task runner abstraction.
//!
//! The execution pool never performs work itself; it hands each admitted task
//! to a [`TaskRunner`] and waits for the outcome. Production code uses
//! [`SimulatedRunner`]; tests provide deterministic fakes.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::debug;

use crate::types::{Task, TaskOutcome};

/// Trait abstracting how a task's work is carried out.
pub trait TaskRunner: Send + Sync {
    /// Run `task` to completion and report how it went.
    ///
    /// The pool may drop the returned future at any point to cancel the task,
    /// so implementations must not rely on running to the end.
    fn execute(&self, task: Task) -> Pin<Box<dyn Future<Output = TaskOutcome> + Send + '_>>;
}

/// Runner that treats `duration_ms` as the work: it waits that long and then
/// succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedRunner;

impl TaskRunner for SimulatedRunner {
    fn execute(&self, task: Task) -> Pin<Box<dyn Future<Output = TaskOutcome> + Send + '_>> {
        Box::pin(async move {
            debug!(
                task = %task.id,
                task_type = %task.task_type,
                duration_ms = task.duration_ms,
                "simulating task work"
            );
            tokio::time::sleep(Duration::from_millis(task.duration_ms)).await;
            TaskOutcome::Success
        })
    }
}
