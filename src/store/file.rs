// src/store/file.rs

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{Result, TaskgateError};
use crate::fs::FileSystem;
use crate::store::table::TaskTable;
use crate::store::{StoreFuture, TaskStore};
use crate::types::{Task, TaskId, TaskStatus};

const SNAPSHOT_VERSION: u32 = 1;

/// On-disk layout of the snapshot file.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    tasks: Vec<Task>,
}

/// Task store persisted as a JSON snapshot file.
///
/// Every mutation rewrites the whole snapshot (write to a sibling temp file,
/// then rename over the original). The in-memory table only changes once the
/// write has succeeded, so a failed write leaves both disk and memory at the
/// previous state.
#[derive(Debug)]
pub struct FileTaskStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    table: Mutex<TaskTable>,
}

impl FileTaskStore {
    /// Open the snapshot at `path`, starting empty if it does not exist yet.
    pub fn open(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let table = if fs.exists(&path) {
            let contents = fs.read_to_string(&path)?;
            let snapshot: Snapshot = serde_json::from_str(&contents)?;
            if snapshot.version != SNAPSHOT_VERSION {
                return Err(TaskgateError::Store(format!(
                    "unsupported snapshot version {} in {:?} (expected {})",
                    snapshot.version, path, SNAPSHOT_VERSION
                )));
            }
            info!(path = ?path, tasks = snapshot.tasks.len(), "loaded task snapshot");
            TaskTable::from_tasks(snapshot.tasks)?
        } else {
            info!(path = ?path, "no task snapshot yet; starting empty");
            TaskTable::new()
        };

        Ok(Self {
            fs,
            path,
            table: Mutex::new(table),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, TaskTable>> {
        self.table
            .lock()
            .map_err(|_| TaskgateError::Store("file store lock poisoned".to_string()))
    }

    /// Apply `change` to a copy of the table, persist the copy, then swap it
    /// in.
    fn mutate<T, F>(&self, change: F) -> Result<T>
    where
        F: FnOnce(&mut TaskTable) -> Result<T>,
    {
        let mut table = self.lock()?;
        let mut next = table.clone();
        let out = change(&mut next)?;
        self.persist(&next)?;
        *table = next;
        Ok(out)
    }

    fn persist(&self, table: &TaskTable) -> Result<()> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            tasks: table.snapshot(),
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        let tmp = tmp_path(&self.path);
        self.fs
            .write(&tmp, &bytes)
            .and_then(|_| self.fs.rename(&tmp, &self.path))
            .map_err(|e| TaskgateError::Store(format!("{e:#}")))?;

        debug!(path = ?self.path, tasks = table.len(), "wrote task snapshot");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

impl TaskStore for FileTaskStore {
    fn insert(&self, task: Task) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            debug!(task = %task.id, "inserting task (file)");
            self.mutate(|table| table.insert(task))
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
        Box::pin(async move { self.mutate(|table| table.update_status(id, status)) })
    }

    fn find_completed_ids(&self) -> StoreFuture<'_, Vec<TaskId>> {
        Box::pin(async move { Ok(self.lock()?.completed_ids()) })
    }
}
