// src/store/table.rs

//! In-memory task records shared by the memory and file stores.

use std::collections::HashMap;

use chrono::Utc;

use crate::errors::{Result, TaskgateError};
use crate::types::{Task, TaskId, TaskStatus};

#[derive(Debug, Clone)]
struct Entry {
    /// Insertion sequence; tie-break for equal `created_at`.
    seq: u64,
    task: Task,
}

/// Keyed task records plus the insertion order needed for deterministic
/// queries.
#[derive(Debug, Clone, Default)]
pub struct TaskTable {
    entries: HashMap<TaskId, Entry>,
    next_seq: u64,
}

impl TaskTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a table from a snapshot, keeping the snapshot's order as the
    /// insertion order.
    pub fn from_tasks(tasks: Vec<Task>) -> Result<Self> {
        let mut table = Self::new();
        for task in tasks {
            table.insert(task)?;
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, task: Task) -> Result<()> {
        if self.entries.contains_key(&task.id) {
            return Err(TaskgateError::Validation(format!(
                "task '{}' already exists",
                task.id
            )));
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(task.id.clone(), Entry { seq, task });
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        self.entries.get(id).map(|e| e.task.clone())
    }

    pub fn find_by_status(&self, status: TaskStatus) -> Vec<Task> {
        let mut matching: Vec<&Entry> = self
            .entries
            .values()
            .filter(|e| e.task.status == status)
            .collect();
        matching.sort_by_key(|e| (e.task.created_at, e.seq));
        matching.into_iter().map(|e| e.task.clone()).collect()
    }

    pub fn find_by_ids(&self, ids: &[TaskId]) -> Vec<TaskId> {
        ids.iter()
            .filter(|id| self.entries.contains_key(id.as_str()))
            .cloned()
            .collect()
    }

    pub fn update_status(&mut self, id: &str, status: TaskStatus) -> Result<Task> {
        let entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| TaskgateError::TaskNotFound(id.to_string()))?;

        if !entry.task.status.can_transition_to(status) {
            return Err(TaskgateError::Validation(format!(
                "task '{}' cannot move from {} to {}",
                id, entry.task.status, status
            )));
        }

        entry.task.status = status;
        entry.task.updated_at = Utc::now();
        Ok(entry.task.clone())
    }

    pub fn completed_ids(&self) -> Vec<TaskId> {
        let mut completed: Vec<&Entry> = self
            .entries
            .values()
            .filter(|e| e.task.status == TaskStatus::Completed)
            .collect();
        completed.sort_by_key(|e| e.seq);
        completed.into_iter().map(|e| e.task.id.clone()).collect()
    }

    /// Every record in insertion order.
    pub fn snapshot(&self) -> Vec<Task> {
        let mut all: Vec<&Entry> = self.entries.values().collect();
        all.sort_by_key(|e| e.seq);
        all.into_iter().map(|e| e.task.clone()).collect()
    }
}
