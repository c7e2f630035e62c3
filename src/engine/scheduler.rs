// src/engine/scheduler.rs

use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::dag::DependencyResolver;
use crate::engine::runtime::{SchedulerRuntime, StopRequest};
use crate::engine::{SchedulerEvent, SchedulerOptions};
use crate::errors::{Result, TaskgateError};
use crate::exec::{ExecutionPool, PoolEvent, TaskRunner};
use crate::store::TaskStore;
use crate::types::StartupLoadPolicy;

enum SchedulerState {
    Stopped,
    Running {
        stop_tx: oneshot::Sender<StopRequest>,
        tick_requests: Arc<Notify>,
        pool: ExecutionPool,
        handle: JoinHandle<()>,
    },
}

/// Start/stop handle for the scheduling loop.
///
/// `start` loads the completed-set from the store and spawns a
/// [`SchedulerRuntime`] actor; `stop` cancels everything in flight and returns
/// only after every cancelled task has been written back as `Failed`.
///
/// Only one scheduler may drive a given store at a time.
pub struct Scheduler {
    store: Arc<dyn TaskStore>,
    runner: Arc<dyn TaskRunner>,
    options: SchedulerOptions,
    events: mpsc::UnboundedSender<SchedulerEvent>,
    state: SchedulerState,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("options", &self.options)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Build a stopped scheduler. Lifecycle events are published on `events`.
    pub fn new(
        store: Arc<dyn TaskStore>,
        runner: Arc<dyn TaskRunner>,
        options: SchedulerOptions,
        events: mpsc::UnboundedSender<SchedulerEvent>,
    ) -> Self {
        Self {
            store,
            runner,
            options,
            events,
            state: SchedulerState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, SchedulerState::Running { .. })
    }

    /// Tasks currently executing (0 while stopped).
    pub fn active_count(&self) -> usize {
        match &self.state {
            SchedulerState::Running { pool, .. } => pool.active_count(),
            SchedulerState::Stopped => 0,
        }
    }

    /// Start polling. No-op if already running.
    ///
    /// With `StartupLoadPolicy::FailClosed` a failure to load the completed
    /// ids is returned and the scheduler stays stopped; with `FailOpen` it is
    /// logged and the scheduler starts with an empty completed-set.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }

        let resolver = self.load_resolver().await?;

        let (pool_tx, pool_rx) = mpsc::unbounded_channel::<PoolEvent>();
        let pool = ExecutionPool::new(
            self.options.max_concurrent_tasks,
            Arc::clone(&self.runner),
            pool_tx,
        );

        let (stop_tx, stop_rx) = oneshot::channel::<StopRequest>();
        let tick_requests = Arc::new(Notify::new());

        let runtime = SchedulerRuntime::new(
            Arc::clone(&self.store),
            resolver,
            pool.clone(),
            pool_rx,
            stop_rx,
            Arc::clone(&tick_requests),
            self.events.clone(),
            self.options.polling_interval,
        );
        let handle = tokio::spawn(runtime.run());

        self.state = SchedulerState::Running {
            stop_tx,
            tick_requests,
            pool,
            handle,
        };
        info!("scheduler started");
        Ok(())
    }

    /// Stop polling and cancel every running task. No-op if stopped.
    ///
    /// Returns once the actor has exited, i.e. after each cancelled task's
    /// `Failed` write has been attempted and its `TaskCancelled` event
    /// published.
    pub async fn stop(&mut self) -> Result<()> {
        let state = std::mem::replace(&mut self.state, SchedulerState::Stopped);
        let SchedulerState::Running {
            stop_tx, handle, ..
        } = state
        else {
            return Ok(());
        };

        let (ack_tx, ack_rx) = oneshot::channel::<()>();
        if stop_tx.send(ack_tx).is_ok() {
            let _ = ack_rx.await;
        }

        handle
            .await
            .map_err(|e| TaskgateError::Other(anyhow!("scheduler loop panicked: {e}")))?;

        info!("scheduler stopped");
        Ok(())
    }

    /// Ask the running loop for a poll tick now instead of at the next
    /// interval. Requests made while a tick is already pending are merged.
    pub fn trigger_tick(&self) {
        if let SchedulerState::Running { tick_requests, .. } = &self.state {
            tick_requests.notify_one();
        }
    }

    async fn load_resolver(&self) -> Result<DependencyResolver> {
        let mut resolver = DependencyResolver::new();

        match self.store.find_completed_ids().await {
            Ok(ids) => {
                info!(completed = ids.len(), "loaded completed tasks from store");
                resolver.load_completed_tasks(ids);
            }
            Err(err) => match self.options.startup_load {
                StartupLoadPolicy::FailOpen => {
                    warn!(
                        error = %err,
                        "failed to load completed tasks; starting with an empty set \
                         (tasks depending on earlier work stay blocked)"
                    );
                }
                StartupLoadPolicy::FailClosed => {
                    return Err(TaskgateError::StartupLoad(err.to_string()));
                }
            },
        }

        Ok(resolver)
    }
}
