use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical task identifier type used throughout the crate.
pub type TaskId = String;

/// Persisted lifecycle status of a task.
///
/// Transitions only ever move forward:
/// `Queued -> Running -> {Completed, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Whether a stored task may move from `self` to `next`.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        match (self, next) {
            (TaskStatus::Queued, TaskStatus::Running) => true,
            (TaskStatus::Running, TaskStatus::Completed | TaskStatus::Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Queued => "QUEUED",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// A unit of work as recorded in the task store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Free-form type tag, interpreted by the task runner.
    pub task_type: String,
    /// How long the work is expected to take, in milliseconds.
    pub duration_ms: u64,
    pub status: TaskStatus,
    /// Ids this task waits for, in the order the creator listed them.
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Build a freshly created, `Queued` task stamped with the current time.
    pub fn queued(new: NewTask) -> Self {
        let now = Utc::now();
        Self {
            id: new.id,
            task_type: new.task_type,
            duration_ms: new.duration_ms,
            status: TaskStatus::Queued,
            dependencies: new.dependencies,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Creation request for a task, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewTask {
    pub id: TaskId,
    pub task_type: String,
    pub duration_ms: u64,
    pub dependencies: Vec<TaskId>,
}

/// Result reported by a task runner once a task's work has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(String),
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success)
    }
}

/// Where task records are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// JSON snapshot file on disk (survives restarts).
    File,
    /// Process memory only (lost on restart).
    Memory,
}

impl Default for StorageMode {
    fn default() -> Self {
        StorageMode::File
    }
}

/// What `Scheduler::start` does when the completed-task ids cannot be loaded.
///
/// - `FailOpen`: log and start with an empty completed-set. Tasks depending on
///   work completed before the restart stay blocked until a later restart
///   loads the ids successfully.
/// - `FailClosed`: refuse to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartupLoadPolicy {
    FailOpen,
    FailClosed,
}

impl Default for StartupLoadPolicy {
    fn default() -> Self {
        StartupLoadPolicy::FailOpen
    }
}

impl FromStr for StartupLoadPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "fail_open" => Ok(StartupLoadPolicy::FailOpen),
            "fail_closed" => Ok(StartupLoadPolicy::FailClosed),
            other => Err(format!(
                "invalid startup_load: {other} (expected \"fail_open\" or \"fail_closed\")"
            )),
        }
    }
}
