//! A `TaskStore` wrapper with switchable failures.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use taskgate::errors::TaskgateError;
use taskgate::store::{MemoryTaskStore, StoreFuture, TaskStore};
use taskgate::types::{Task, TaskId, TaskStatus};

/// Wraps a [`MemoryTaskStore`]; each switch makes the matching operation
/// return `TaskgateError::Store` without touching the inner store.
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub inner: MemoryTaskStore,
    fail_find_by_status: AtomicBool,
    fail_completed_ids: AtomicBool,
    failing_updates: Mutex<HashSet<TaskStatus>>,
    find_by_status_calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: MemoryTaskStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn set_fail_find_by_status(&self, fail: bool) {
        self.fail_find_by_status.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_completed_ids(&self, fail: bool) {
        self.fail_completed_ids.store(fail, Ordering::SeqCst);
    }

    /// Make `update_status(_, status)` fail (or stop failing).
    pub fn set_fail_updates_to(&self, status: TaskStatus, fail: bool) {
        let mut failing = self.failing_updates.lock().unwrap();
        if fail {
            failing.insert(status);
        } else {
            failing.remove(&status);
        }
    }

    /// How many times `find_by_status` was called, failed or not.
    pub fn find_by_status_calls(&self) -> usize {
        self.find_by_status_calls.load(Ordering::SeqCst)
    }

    fn injected<'a, T: Send + 'a>(op: &'static str) -> StoreFuture<'a, T> {
        Box::pin(async move {
            Err::<T, _>(TaskgateError::Store(format!("injected failure in {op}")))
        })
    }
}

impl TaskStore for FlakyStore {
    fn insert(&self, task: Task) -> StoreFuture<'_, ()> {
        self.inner.insert(task)
    }

    fn get<'a>(&'a self, id: &'a str) -> StoreFuture<'a, Option<Task>> {
        self.inner.get(id)
    }

    fn find_by_status(&self, status: TaskStatus) -> StoreFuture<'_, Vec<Task>> {
        self.find_by_status_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_find_by_status.load(Ordering::SeqCst) {
            return Self::injected("find_by_status");
        }
        self.inner.find_by_status(status)
    }

    fn find_by_ids<'a>(&'a self, ids: &'a [TaskId]) -> StoreFuture<'a, Vec<TaskId>> {
        self.inner.find_by_ids(ids)
    }

    fn update_status<'a>(&'a self, id: &'a str, status: TaskStatus) -> StoreFuture<'a, Task> {
        if self.failing_updates.lock().unwrap().contains(&status) {
            return Self::injected("update_status");
        }
        self.inner.update_status(id, status)
    }

    fn find_completed_ids(&self) -> StoreFuture<'_, Vec<TaskId>> {
        if self.fail_completed_ids.load(Ordering::SeqCst) {
            return Self::injected("find_completed_ids");
        }
        self.inner.find_completed_ids()
    }
}
