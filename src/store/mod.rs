// src/store/mod.rs

//! Persistent task store.
//!
//! The scheduler only talks to a [`TaskStore`]; the concrete engine is a
//! boundary collaborator.
//!
//! - [`memory`] keeps records in process memory (tests, throwaway runs).
//! - [`file`] keeps a JSON snapshot on disk through [`crate::fs::FileSystem`].
//! - [`intake`] is the validated creation path used before a task ever
//!   reaches the scheduler.
//! - [`table`] holds the record bookkeeping both stores share.

pub mod file;
pub mod intake;
pub mod memory;
pub mod table;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::model::StoreSection;
use crate::errors::Result;
use crate::fs::RealFileSystem;
use crate::types::{StorageMode, Task, TaskId, TaskStatus};

pub use file::FileTaskStore;
pub use intake::{seed_from_config, submit_task};
pub use memory::MemoryTaskStore;

/// Boxed future returned by every store operation.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Durable keyed record of tasks, queryable by status.
///
/// Implementations must be safe to share between the scheduler actor and the
/// pool's completion path. Only a single scheduler may drive a given store:
/// nothing here spans "check eligibility -> mark running -> admit" in one
/// transaction.
pub trait TaskStore: Send + Sync {
    /// Insert a new record. Fails with `Validation` if the id exists.
    fn insert(&self, task: Task) -> StoreFuture<'_, ()>;

    /// Point lookup.
    fn get<'a>(&'a self, id: &'a str) -> StoreFuture<'a, Option<Task>>;

    /// All tasks with `status`, oldest first. Ties on `created_at` are broken
    /// by insertion order.
    fn find_by_status(&self, status: TaskStatus) -> StoreFuture<'_, Vec<Task>>;

    /// The subset of `ids` that exist, in the order given.
    fn find_by_ids<'a>(&'a self, ids: &'a [TaskId]) -> StoreFuture<'a, Vec<TaskId>>;

    /// Move a task to `status` and return the updated record. Fails with
    /// `TaskNotFound` for unknown ids and `Validation` for backward moves.
    fn update_status<'a>(&'a self, id: &'a str, status: TaskStatus) -> StoreFuture<'a, Task>;

    /// Ids of every `Completed` task.
    fn find_completed_ids(&self) -> StoreFuture<'_, Vec<TaskId>>;
}

/// Build the store selected by `[store]`. Relative file paths are resolved
/// against `root`.
pub fn open_store(section: &StoreSection, root: &std::path::Path) -> Result<Arc<dyn TaskStore>> {
    match section.mode {
        StorageMode::Memory => Ok(Arc::new(MemoryTaskStore::new())),
        StorageMode::File => {
            let path = if section.path.is_absolute() {
                section.path.clone()
            } else {
                root.join(&section.path)
            };
            let store = FileTaskStore::open(Arc::new(RealFileSystem), path)?;
            Ok(Arc::new(store))
        }
    }
}
