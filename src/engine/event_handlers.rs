// src/engine/event_handlers.rs

//! Reactions to execution pool events.

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dag::DependencyResolver;
use crate::engine::SchedulerEvent;
use crate::exec::PoolEvent;
use crate::store::TaskStore;
use crate::types::{Task, TaskOutcome, TaskStatus};

/// What the runtime loop should do after an event was handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventStep {
    /// A pool slot was freed; run an extra poll tick without waiting for the
    /// interval.
    pub extra_tick: bool,
}

/// Dispatch a single pool event.
pub async fn handle_pool_event(
    store: &dyn TaskStore,
    resolver: &mut DependencyResolver,
    events: &mpsc::UnboundedSender<SchedulerEvent>,
    event: PoolEvent,
) -> EventStep {
    match event {
        PoolEvent::Started(task) => handle_task_started(events, task),
        PoolEvent::Completed { task, outcome } => {
            handle_task_completion(store, resolver, events, task, outcome).await
        }
        PoolEvent::Cancelled { id } => handle_task_cancelled(store, events, id).await,
    }
}

/// Pool admitted a task: republish, nothing else changes.
pub fn handle_task_started(
    events: &mpsc::UnboundedSender<SchedulerEvent>,
    task: Task,
) -> EventStep {
    debug!(task = %task.id, "task started");
    publish(events, SchedulerEvent::TaskStarted(task));
    EventStep::default()
}

/// Runner finished.
///
/// - `Success`: persist `Completed`, register the id with the resolver and
///   publish `TaskCompleted`. If the write fails the task stays `Running` in
///   the store and is not registered.
/// - `Failed`: persist `Failed` and publish `TaskFailed`. Dependents stay
///   queued.
///
/// Either way the pool slot is free, so an extra tick is requested.
pub async fn handle_task_completion(
    store: &dyn TaskStore,
    resolver: &mut DependencyResolver,
    events: &mpsc::UnboundedSender<SchedulerEvent>,
    task: Task,
    outcome: TaskOutcome,
) -> EventStep {
    match outcome {
        TaskOutcome::Success => {
            match store.update_status(&task.id, TaskStatus::Completed).await {
                Ok(updated) => {
                    resolver.register_completed_task(&updated.id);
                    info!(task = %updated.id, "task completed");
                    publish(events, SchedulerEvent::TaskCompleted(updated));
                }
                Err(err) => {
                    error!(
                        task = %task.id,
                        error = %err,
                        "failed to persist completion; task remains RUNNING in store"
                    );
                }
            }
        }
        TaskOutcome::Failed(reason) => {
            match store.update_status(&task.id, TaskStatus::Failed).await {
                Ok(updated) => {
                    warn!(task = %updated.id, reason = %reason, "task failed");
                    publish(
                        events,
                        SchedulerEvent::TaskFailed {
                            task: updated,
                            reason,
                        },
                    );
                }
                Err(err) => {
                    error!(
                        task = %task.id,
                        reason = %reason,
                        error = %err,
                        "failed to persist task failure; task remains RUNNING in store"
                    );
                }
            }
        }
    }

    EventStep { extra_tick: true }
}

/// Task was cancelled by shutdown: persist `Failed` and publish
/// `TaskCancelled`. The event is published even if the write fails.
pub async fn handle_task_cancelled(
    store: &dyn TaskStore,
    events: &mpsc::UnboundedSender<SchedulerEvent>,
    id: String,
) -> EventStep {
    match store.update_status(&id, TaskStatus::Failed).await {
        Ok(_) => info!(task = %id, "cancelled task marked FAILED"),
        Err(err) => error!(
            task = %id,
            error = %err,
            "failed to persist cancellation"
        ),
    }

    publish(events, SchedulerEvent::TaskCancelled { id });
    EventStep::default()
}

fn publish(events: &mpsc::UnboundedSender<SchedulerEvent>, event: SchedulerEvent) {
    if events.send(event).is_err() {
        debug!("no scheduler event subscriber; dropping event");
    }
}
