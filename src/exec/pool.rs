// src/exec/pool.rs

//! Bounded-concurrency execution pool.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::exec::runner::TaskRunner;
use crate::types::{Task, TaskId, TaskOutcome};

/// Lifecycle events emitted by the pool, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEvent {
    /// The task was admitted and handed to the runner.
    Started(Task),
    /// The runner finished. The slot has already been freed.
    Completed { task: Task, outcome: TaskOutcome },
    /// The task was stopped before the runner finished.
    Cancelled { id: TaskId },
}

/// Internal handle for a task currently in flight.
///
/// - `seq` identifies this particular admission, so a run that finishes late
///   never removes a newer admission of the same id.
/// - `cancel` tells the spawned run to drop the runner's future.
#[derive(Debug)]
struct ActiveRun {
    seq: u64,
    cancel: oneshot::Sender<()>,
}

#[derive(Debug, Default)]
struct PoolState {
    /// Active-run table. Its length is the active count, so the two can never
    /// disagree.
    active: HashMap<TaskId, ActiveRun>,
    next_seq: u64,
}

/// Runs admitted tasks through a [`TaskRunner`] with at most
/// `max_concurrent_tasks` in flight.
///
/// Admission, completion and cancellation each take the state lock once and
/// emit their event while still holding it, so observers never see a torn
/// state and events arrive in the order the mutations happened.
///
/// Cloning yields another handle onto the same pool.
#[derive(Clone)]
pub struct ExecutionPool {
    max_concurrent_tasks: usize,
    runner: Arc<dyn TaskRunner>,
    state: Arc<Mutex<PoolState>>,
    events: mpsc::UnboundedSender<PoolEvent>,
}

impl std::fmt::Debug for ExecutionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionPool")
            .field("max_concurrent_tasks", &self.max_concurrent_tasks)
            .field("active_count", &self.active_count())
            .finish_non_exhaustive()
    }
}

impl ExecutionPool {
    /// Create a pool that reports lifecycle events on `events`.
    ///
    /// `max_concurrent_tasks` is clamped to at least 1.
    pub fn new(
        max_concurrent_tasks: usize,
        runner: Arc<dyn TaskRunner>,
        events: mpsc::UnboundedSender<PoolEvent>,
    ) -> Self {
        Self {
            max_concurrent_tasks: max_concurrent_tasks.max(1),
            runner,
            state: Arc::new(Mutex::new(PoolState::default())),
            events,
        }
    }

    pub fn max_concurrent_tasks(&self) -> usize {
        self.max_concurrent_tasks
    }

    pub fn active_count(&self) -> usize {
        self.lock_state().active.len()
    }

    pub fn has_capacity(&self) -> bool {
        self.lock_state().active.len() < self.max_concurrent_tasks
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.lock_state().active.contains_key(id)
    }

    /// Ids currently in flight, in admission order.
    pub fn active_ids(&self) -> Vec<TaskId> {
        let state = self.lock_state();
        let mut runs: Vec<(&TaskId, u64)> =
            state.active.iter().map(|(id, run)| (id, run.seq)).collect();
        runs.sort_by_key(|(_, seq)| *seq);
        runs.into_iter().map(|(id, _)| id.clone()).collect()
    }

    /// Admit `task` and start running it.
    ///
    /// Returns `false` without side effects if the pool is full or the id is
    /// already active. On success `Started` has been emitted by the time this
    /// returns; `Completed` follows once the runner finishes.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn execute_task(&self, task: Task) -> bool {
        let mut state = self.lock_state();

        if state.active.len() >= self.max_concurrent_tasks {
            debug!(task = %task.id, "pool at capacity; rejecting admission");
            return false;
        }
        if state.active.contains_key(&task.id) {
            debug!(task = %task.id, "task already active; rejecting admission");
            return false;
        }

        let seq = state.next_seq;
        state.next_seq += 1;

        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        state.active.insert(
            task.id.clone(),
            ActiveRun {
                seq,
                cancel: cancel_tx,
            },
        );

        info!(
            task = %task.id,
            active = state.active.len(),
            max = self.max_concurrent_tasks,
            "task admitted"
        );
        let _ = self.events.send(PoolEvent::Started(task.clone()));

        let pool = self.clone();
        tokio::spawn(async move {
            pool.run(task, seq, cancel_rx).await;
        });

        true
    }

    /// Stop an active task. Returns `false` if `id` is not active.
    pub fn cancel_task(&self, id: &str) -> bool {
        let mut state = self.lock_state();

        let Some(run) = state.active.remove(id) else {
            return false;
        };

        info!(task = %id, "cancelling active task");
        self.cancel_run(id.to_string(), run);
        true
    }

    /// Cancel every active task (in admission order) and reset the pool.
    ///
    /// Returns the number of tasks cancelled. Safe to call on an idle pool.
    pub fn shutdown(&self) -> usize {
        let mut state = self.lock_state();

        let mut runs: Vec<(TaskId, ActiveRun)> = state.active.drain().collect();
        runs.sort_by_key(|(_, run)| run.seq);

        let cancelled = runs.len();
        for (id, run) in runs {
            self.cancel_run(id, run);
        }

        info!(cancelled, "execution pool shut down");
        cancelled
    }

    /// Signal a run that has already been removed from the table and emit
    /// `Cancelled`. Callers hold the state lock.
    fn cancel_run(&self, id: TaskId, run: ActiveRun) {
        if run.cancel.send(()).is_err() {
            debug!(task = %id, "run already finished while cancelling");
        }
        let _ = self.events.send(PoolEvent::Cancelled { id });
    }

    /// Body of the spawned Tokio task for one admission.
    async fn run(self, task: Task, seq: u64, cancel_rx: oneshot::Receiver<()>) {
        let runner = Arc::clone(&self.runner);

        tokio::select! {
            outcome = runner.execute(task.clone()) => {
                self.finish(task, seq, outcome);
            }
            _ = cancel_rx => {
                debug!(task = %task.id, "run cancelled; runner future dropped");
            }
        }
    }

    fn finish(&self, task: Task, seq: u64, outcome: TaskOutcome) {
        let mut state = self.lock_state();

        match state.active.get(&task.id) {
            Some(run) if run.seq == seq => {
                state.active.remove(&task.id);
            }
            _ => {
                debug!(task = %task.id, "run finished after it was cancelled; ignoring");
                return;
            }
        }

        info!(
            task = %task.id,
            success = outcome.is_success(),
            active = state.active.len(),
            "task run finished"
        );
        let _ = self.events.send(PoolEvent::Completed { task, outcome });
    }

    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        // No mutation can panic halfway through, so a poisoned table is intact.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
