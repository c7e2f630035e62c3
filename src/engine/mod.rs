// src/engine/mod.rs

//! Scheduling engine for taskgate.
//!
//! This module ties together:
//! - the dependency resolver (which queued tasks may run)
//! - the execution pool (how many may run at once)
//! - the task store (what is queued, and where outcomes are recorded)
//!
//! [`scheduler`] is the public start/stop handle. The loop itself runs as a
//! single actor in [`runtime`]; one poll pass lives in [`tick`] and the
//! reactions to pool events in [`event_handlers`]. [`backlog`] summarises
//! outstanding work for callers deciding when a run is finished.

use std::time::Duration;

use crate::config::model::SchedulerSection;
use crate::types::{StartupLoadPolicy, Task, TaskId};

/// Events published by the scheduler for outside observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// A task was admitted into the pool. Carries the `Running` snapshot.
    TaskStarted(Task),
    /// A task finished successfully and was persisted `Completed`.
    TaskCompleted(Task),
    /// A task's runner reported failure; the task was marked `Failed`.
    TaskFailed { task: Task, reason: String },
    /// A task was cancelled by `Scheduler::stop`.
    TaskCancelled { id: TaskId },
}

/// Scheduler settings fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    pub max_concurrent_tasks: usize,
    pub polling_interval: Duration,
    pub startup_load: StartupLoadPolicy,
}

impl SchedulerOptions {
    pub fn from_config(section: &SchedulerSection) -> Self {
        Self {
            max_concurrent_tasks: section.max_concurrent_tasks,
            polling_interval: Duration::from_millis(section.polling_interval_ms),
            startup_load: section.startup_load,
        }
    }
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self::from_config(&SchedulerSection::default())
    }
}

pub mod backlog;
pub mod event_handlers;
pub mod runtime;
pub mod scheduler;
pub mod tick;

pub use backlog::{backlog, Backlog};
pub use runtime::SchedulerRuntime;
pub use scheduler::Scheduler;
