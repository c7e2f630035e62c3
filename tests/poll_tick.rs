mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::sync::Arc;

use tokio::sync::mpsc;

use taskgate::dag::DependencyResolver;
use taskgate::engine::tick::{TickReport, poll_tick};
use taskgate::exec::{ExecutionPool, PoolEvent};
use taskgate::store::{MemoryTaskStore, TaskStore};
use taskgate::types::TaskStatus;
use taskgate_test_utils::builders::TaskBuilder;
use taskgate_test_utils::fake_runner::ControllableRunner;
use taskgate_test_utils::flaky_store::FlakyStore;

type TestResult = Result<(), Box<dyn Error>>;

fn store_with(ids: &[(&str, &[&str])]) -> FlakyStore {
    let tasks = ids
        .iter()
        .enumerate()
        .map(|(i, (id, deps))| {
            deps.iter()
                .fold(TaskBuilder::new(id), |b, d| b.after(d))
                .created_offset_ms(i as i64 * 10)
                .build()
        })
        .collect();
    FlakyStore::new(MemoryTaskStore::with_tasks(tasks).unwrap())
}

fn pool(max: usize) -> (ExecutionPool, mpsc::UnboundedReceiver<PoolEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ExecutionPool::new(max, Arc::new(ControllableRunner::new()), tx),
        rx,
    )
}

#[tokio::test]
async fn admits_oldest_eligible_tasks_up_to_capacity() -> TestResult {
    init_tracing();
    let store = store_with(&[("a", &[]), ("b", &[]), ("c", &[])]);
    let resolver = DependencyResolver::new();
    let (pool, _rx) = pool(2);

    let report = poll_tick(&store, &resolver, &pool).await;

    assert_eq!(
        report,
        TickReport {
            queued: 3,
            eligible: 3,
            admitted: 2,
            rejected: 0,
            skipped: false,
        }
    );
    assert_eq!(pool.active_ids(), vec!["a", "b"]);
    assert_eq!(store.get("a").await?.map(|t| t.status), Some(TaskStatus::Running));
    assert_eq!(store.get("b").await?.map(|t| t.status), Some(TaskStatus::Running));
    assert_eq!(store.get("c").await?.map(|t| t.status), Some(TaskStatus::Queued));
    Ok(())
}

#[tokio::test]
async fn tasks_with_unfinished_dependencies_stay_queued() -> TestResult {
    let store = store_with(&[("a", &[]), ("b", &["a"])]);
    let (pool, _rx) = pool(4);

    let report = poll_tick(&store, &DependencyResolver::new(), &pool).await;
    assert_eq!(report.eligible, 1);
    assert_eq!(pool.active_ids(), vec!["a"]);

    let mut resolver = DependencyResolver::new();
    resolver.register_completed_task("a");
    let report = poll_tick(&store, &resolver, &pool).await;
    assert_eq!(report.queued, 1);
    assert_eq!(report.admitted, 1);
    assert_eq!(pool.active_ids(), vec!["a", "b"]);
    Ok(())
}

#[tokio::test]
async fn full_pool_skips_the_store_query() -> TestResult {
    let store = store_with(&[("a", &[]), ("b", &[])]);
    let (pool, _rx) = pool(1);
    let resolver = DependencyResolver::new();

    poll_tick(&store, &resolver, &pool).await;
    let calls = store.find_by_status_calls();

    let report = poll_tick(&store, &resolver, &pool).await;
    assert!(report.skipped);
    assert_eq!(store.find_by_status_calls(), calls);
    Ok(())
}

#[tokio::test]
async fn query_failure_ends_the_tick_quietly() -> TestResult {
    let store = store_with(&[("a", &[])]);
    store.set_fail_find_by_status(true);
    let (pool, _rx) = pool(1);

    let report = poll_tick(&store, &DependencyResolver::new(), &pool).await;

    assert_eq!(report, TickReport::default());
    assert_eq!(pool.active_count(), 0);

    store.set_fail_find_by_status(false);
    let report = poll_tick(&store, &DependencyResolver::new(), &pool).await;
    assert_eq!(report.admitted, 1, "next tick recovers");
    Ok(())
}

#[tokio::test]
async fn task_refused_by_the_pool_is_not_left_running() -> TestResult {
    let store = store_with(&[("a", &[]), ("b", &[])]);
    let (pool, _rx) = pool(4);

    // An admission the store does not know about holds the id in the pool.
    assert!(pool.execute_task(TaskBuilder::new("a").build()));

    let report = poll_tick(&store, &DependencyResolver::new(), &pool).await;

    assert_eq!(report.admitted, 1);
    assert_eq!(report.rejected, 1);
    assert_eq!(store.get("a").await?.map(|t| t.status), Some(TaskStatus::Failed));
    assert_eq!(store.get("b").await?.map(|t| t.status), Some(TaskStatus::Running));
    Ok(())
}

#[tokio::test]
async fn failure_to_mark_running_admits_nothing() -> TestResult {
    let store = store_with(&[("a", &[]), ("b", &[])]);
    store.set_fail_updates_to(TaskStatus::Running, true);
    let (pool, mut rx) = pool(2);

    let report = poll_tick(&store, &DependencyResolver::new(), &pool).await;

    assert_eq!(report.eligible, 2);
    assert_eq!(report.admitted, 0);
    assert_eq!(pool.active_count(), 0);
    assert!(rx.try_recv().is_err());
    assert_eq!(store.find_by_status(TaskStatus::Queued).await?.len(), 2);
    Ok(())
}
