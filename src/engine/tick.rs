// src/engine/tick.rs

//! One poll pass: fetch queued tasks, filter, admit up to capacity.

use tracing::{debug, error, info, warn};

use crate::dag::DependencyResolver;
use crate::exec::ExecutionPool;
use crate::store::TaskStore;
use crate::types::TaskStatus;

/// Summary of a single poll pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Number of `Queued` tasks the store returned.
    pub queued: usize,
    /// How many of those were eligible.
    pub eligible: usize,
    /// How many were marked `Running` and handed to the pool.
    pub admitted: usize,
    /// Marked `Running` but refused by the pool, then written back `Failed`.
    pub rejected: usize,
    /// The pool was full before the store was even queried.
    pub skipped: bool,
}

/// Run one poll pass.
///
/// Each admission first persists `Running` and only then submits the task to
/// the pool, so the stored status is never behind the pool. A store error
/// ends the pass early; the next tick starts over.
pub async fn poll_tick(
    store: &dyn TaskStore,
    resolver: &DependencyResolver,
    pool: &ExecutionPool,
) -> TickReport {
    let mut report = TickReport::default();

    if !pool.has_capacity() {
        debug!(active = pool.active_count(), "pool at capacity; skipping tick");
        report.skipped = true;
        return report;
    }

    let queued = match store.find_by_status(TaskStatus::Queued).await {
        Ok(tasks) => tasks,
        Err(err) => {
            warn!(error = %err, "failed to query queued tasks; skipping tick");
            return report;
        }
    };
    report.queued = queued.len();

    let eligible = resolver.eligible_tasks(&queued);
    report.eligible = eligible.len();

    for task in eligible {
        if !pool.has_capacity() {
            debug!("pool reached capacity; ending admission pass");
            break;
        }

        let running = match store.update_status(&task.id, TaskStatus::Running).await {
            Ok(t) => t,
            Err(err) => {
                warn!(
                    task = %task.id,
                    error = %err,
                    "failed to mark task running; ending tick"
                );
                break;
            }
        };

        if pool.execute_task(running) {
            report.admitted += 1;
            continue;
        }

        // Only the scheduler actor admits, so the store and the pool disagree
        // about this task. Nothing would ever finish it, so close it out.
        report.rejected += 1;
        match store.update_status(&task.id, TaskStatus::Failed).await {
            Ok(_) => error!(
                task = %task.id,
                "pool rejected a task already marked running; marked FAILED"
            ),
            Err(err) => error!(
                task = %task.id,
                error = %err,
                "pool rejected a task already marked running; failed to mark it FAILED"
            ),
        }
    }

    if report.admitted > 0 {
        info!(
            queued = report.queued,
            eligible = report.eligible,
            admitted = report.admitted,
            "poll tick admitted tasks"
        );
    } else {
        debug!(
            queued = report.queued,
            eligible = report.eligible,
            "poll tick admitted nothing"
        );
    }

    report
}
