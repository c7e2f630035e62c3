#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use taskgate::engine::{SchedulerEvent, SchedulerOptions};
use taskgate::store::TaskStore;
use taskgate::types::{StartupLoadPolicy, TaskId, TaskStatus};

pub use taskgate_test_utils::{init_tracing, wait_until, with_timeout};

/// Options with a short polling interval so tests don't wait on the timer.
pub fn fast_options(max_concurrent_tasks: usize) -> SchedulerOptions {
    SchedulerOptions {
        max_concurrent_tasks,
        polling_interval: Duration::from_millis(20),
        startup_load: StartupLoadPolicy::FailOpen,
    }
}

/// Receive the next scheduler event, panicking after 5 seconds.
pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<SchedulerEvent>) -> SchedulerEvent {
    with_timeout(rx.recv())
        .await
        .expect("scheduler event channel closed")
}

/// Receive events until `n` terminal ones (completed / failed / cancelled)
/// have been seen. Returns every event received, in order.
pub async fn collect_until_terminal(
    rx: &mut mpsc::UnboundedReceiver<SchedulerEvent>,
    n: usize,
) -> Vec<SchedulerEvent> {
    let mut seen = Vec::new();
    let mut terminal = 0;
    while terminal < n {
        let event = next_event(rx).await;
        if !matches!(event, SchedulerEvent::TaskStarted(_)) {
            terminal += 1;
        }
        seen.push(event);
    }
    seen
}

/// Short label per event, e.g. `"started:a"`, for order assertions.
pub fn labels(events: &[SchedulerEvent]) -> Vec<String> {
    events
        .iter()
        .map(|e| match e {
            SchedulerEvent::TaskStarted(t) => format!("started:{}", t.id),
            SchedulerEvent::TaskCompleted(t) => format!("completed:{}", t.id),
            SchedulerEvent::TaskFailed { task, .. } => format!("failed:{}", task.id),
            SchedulerEvent::TaskCancelled { id } => format!("cancelled:{id}"),
        })
        .collect()
}

/// Read the stored status of `id`.
pub async fn status_of(store: &Arc<dyn TaskStore>, id: &str) -> TaskStatus {
    store
        .get(id)
        .await
        .expect("store get failed")
        .unwrap_or_else(|| panic!("task {id} not in store"))
        .status
}

pub fn ids(items: &[&str]) -> Vec<TaskId> {
    items.iter().map(|s| s.to_string()).collect()
}
