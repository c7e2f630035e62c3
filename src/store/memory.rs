// src/store/memory.rs

use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::errors::{Result, TaskgateError};
use crate::store::table::TaskTable;
use crate::store::{StoreFuture, TaskStore};
use crate::types::{Task, TaskId, TaskStatus};

/// Task store kept in process memory (lost on restart).
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    table: Mutex<TaskTable>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a store, e.g. to simulate a restart against existing
    /// records.
    pub fn with_tasks(tasks: Vec<Task>) -> Result<Self> {
        Ok(Self {
            table: Mutex::new(TaskTable::from_tasks(tasks)?),
        })
    }

    /// Every record in insertion order.
    pub fn snapshot(&self) -> Result<Vec<Task>> {
        Ok(self.lock()?.snapshot())
    }

    fn lock(&self) -> Result<MutexGuard<'_, TaskTable>> {
        self.table
            .lock()
            .map_err(|_| TaskgateError::Store("memory store lock poisoned".to_string()))
    }
}

impl TaskStore for MemoryTaskStore {
    fn insert(&self, task: Task) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            debug!(task = %task.id, "inserting task (memory)");
            self.lock()?.insert(task)
        })
    }

    fn get<'a>(&'a self, id: &'a str) -> StoreFuture<'a, Option<Task>> {
        Box::pin(async move { Ok(self.lock()?.get(id)) })
    }

    fn find_by_status(&self, status: TaskStatus) -> StoreFuture<'_, Vec<Task>> {
        Box::pin(async move { Ok(self.lock()?.find_by_status(status)) })
    }

    fn find_by_ids<'a>(&'a self, ids: &'a [TaskId]) -> StoreFuture<'a, Vec<TaskId>> {
        Box::pin(async move { Ok(self.lock()?.find_by_ids(ids)) })
    }

    fn update_status<'a>(&'a self, id: &'a str, status: TaskStatus) -> StoreFuture<'a, Task> {
        Box::pin(async move { self.lock()?.update_status(id, status) })
    }

    fn find_completed_ids(&self) -> StoreFuture<'_, Vec<TaskId>> {
        Box::pin(async move { Ok(self.lock()?.completed_ids()) })
    }
}
