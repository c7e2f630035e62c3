//! Deterministic `TaskRunner` fakes.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use taskgate::exec::TaskRunner;
use taskgate::types::{Task, TaskId, TaskOutcome};

type RunFuture<'a> = Pin<Box<dyn Future<Output = TaskOutcome> + Send + 'a>>;

/// Shared bookkeeping for the fakes: which tasks started, which finished, how
/// many were in flight at once and how many futures were dropped early.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    started: Arc<Mutex<Vec<TaskId>>>,
    finished: Arc<Mutex<Vec<TaskId>>>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    dropped: Arc<AtomicUsize>,
}

impl RunLog {
    pub fn started(&self) -> Vec<TaskId> {
        self.started.lock().unwrap().clone()
    }

    pub fn finished(&self) -> Vec<TaskId> {
        self.finished.lock().unwrap().clone()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of runs that were executing at the same time.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Runs whose future was dropped before returning (cancelled).
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    fn enter(&self, id: &str) -> InFlight {
        self.started.lock().unwrap().push(id.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlight {
            log: self.clone(),
            id: id.to_string(),
            finished: false,
        }
    }
}

/// Guard held for the lifetime of one run.
struct InFlight {
    log: RunLog,
    id: TaskId,
    finished: bool,
}

impl InFlight {
    fn finish(mut self) {
        self.finished = true;
        self.log.finished.lock().unwrap().push(self.id.clone());
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.log.in_flight.fetch_sub(1, Ordering::SeqCst);
        if !self.finished {
            self.log.dropped.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Succeeds immediately.
#[derive(Debug, Clone, Default)]
pub struct InstantRunner {
    pub log: RunLog,
}

impl InstantRunner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskRunner for InstantRunner {
    fn execute(&self, task: Task) -> RunFuture<'_> {
        Box::pin(async move {
            let guard = self.log.enter(&task.id);
            guard.finish();
            TaskOutcome::Success
        })
    }
}

/// Sleeps for the task's `duration_ms`, then reports the scripted outcome for
/// its id (`Success` unless told otherwise).
#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    pub log: RunLog,
    failures: Arc<Mutex<HashMap<TaskId, String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `id` fail with `reason`.
    pub fn fail(self, id: &str, reason: &str) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(id.to_string(), reason.to_string());
        self
    }
}

impl TaskRunner for ScriptedRunner {
    fn execute(&self, task: Task) -> RunFuture<'_> {
        Box::pin(async move {
            let guard = self.log.enter(&task.id);
            tokio::time::sleep(Duration::from_millis(task.duration_ms)).await;
            let failure = self.failures.lock().unwrap().get(&task.id).cloned();
            guard.finish();
            match failure {
                Some(reason) => TaskOutcome::Failed(reason),
                None => TaskOutcome::Success,
            }
        })
    }
}

/// Blocks every run until the test releases it with an outcome.
#[derive(Debug, Clone, Default)]
pub struct ControllableRunner {
    pub log: RunLog,
    pending: Arc<Mutex<HashMap<TaskId, oneshot::Sender<TaskOutcome>>>>,
}

impl ControllableRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish the run for `id`. Returns `false` if it is not currently
    /// blocked here.
    pub fn release(&self, id: &str, outcome: TaskOutcome) -> bool {
        let tx = self.pending.lock().unwrap().remove(id);
        match tx {
            Some(tx) => tx.send(outcome).is_ok(),
            None => false,
        }
    }

    pub fn succeed(&self, id: &str) -> bool {
        self.release(id, TaskOutcome::Success)
    }

    /// Ids currently blocked, sorted.
    pub fn waiting(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self.pending.lock().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl TaskRunner for ControllableRunner {
    fn execute(&self, task: Task) -> RunFuture<'_> {
        Box::pin(async move {
            let (tx, rx) = oneshot::channel();
            self.pending.lock().unwrap().insert(task.id.clone(), tx);
            let guard = self.log.enter(&task.id);

            let outcome = rx
                .await
                .unwrap_or_else(|_| TaskOutcome::Failed("runner dropped".to_string()));
            guard.finish();
            outcome
        })
    }
}
