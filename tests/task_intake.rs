use std::error::Error;

use taskgate::errors::TaskgateError;
use taskgate::store::{MemoryTaskStore, TaskStore, seed_from_config, submit_task};
use taskgate::types::{StorageMode, TaskStatus};
use taskgate_test_utils::builders::{ConfigFileBuilder, TaskBuilder, TaskConfigBuilder};

type TestResult = Result<(), Box<dyn Error>>;

fn expect_validation(result: taskgate::errors::Result<taskgate::types::Task>, needle: &str) {
    match result {
        Err(TaskgateError::Validation(msg)) => {
            assert!(msg.contains(needle), "message {msg:?} should contain {needle:?}");
        }
        other => panic!("expected Validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn submitted_task_is_queued() -> TestResult {
    let store = MemoryTaskStore::new();
    let task = submit_task(&store, TaskBuilder::new("a").task_type("compile").new_task()).await?;

    assert_eq!(task.status, TaskStatus::Queued);
    assert_eq!(task.task_type, "compile");
    assert_eq!(task.created_at, task.updated_at);
    assert_eq!(store.get("a").await?, Some(task));
    Ok(())
}

#[tokio::test]
async fn missing_dependencies_are_listed() -> TestResult {
    let store = MemoryTaskStore::new();
    submit_task(&store, TaskBuilder::new("a").new_task()).await?;

    let result = submit_task(
        &store,
        TaskBuilder::new("c")
            .after("a")
            .after("x")
            .after("y")
            .new_task(),
    )
    .await;

    expect_validation(result, "unknown dependencies: x, y");
    assert!(store.get("c").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn field_errors_are_rejected_before_insert() -> TestResult {
    let store = MemoryTaskStore::new();

    expect_validation(
        submit_task(&store, TaskBuilder::new(" ").new_task()).await,
        "id is required",
    );
    expect_validation(
        submit_task(&store, TaskBuilder::new("a").task_type("").new_task()).await,
        "missing a type",
    );
    expect_validation(
        submit_task(&store, TaskBuilder::new("a").duration_ms(0).new_task()).await,
        "positive duration",
    );
    expect_validation(
        submit_task(&store, TaskBuilder::new("a").after("a").new_task()).await,
        "itself",
    );

    assert!(store.find_by_status(TaskStatus::Queued).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn duplicate_dependency_and_duplicate_id_are_rejected() -> TestResult {
    let store = MemoryTaskStore::new();
    submit_task(&store, TaskBuilder::new("a").new_task()).await?;

    expect_validation(
        submit_task(&store, TaskBuilder::new("b").after("a").after("a").new_task()).await,
        "more than once",
    );
    expect_validation(
        submit_task(&store, TaskBuilder::new("a").new_task()).await,
        "already exists",
    );
    Ok(())
}

#[tokio::test]
async fn seeding_inserts_dependencies_first_and_skips_existing() -> TestResult {
    let cfg = ConfigFileBuilder::new()
        .memory_store()
        .with_task("test", TaskConfigBuilder::new("test", 5).after("build").build())
        .with_task("build", TaskConfigBuilder::new("compile", 5).build())
        .with_task(
            "deploy",
            TaskConfigBuilder::new("deploy", 5).after("test").build(),
        )
        .build();

    assert_eq!(cfg.store.mode, StorageMode::Memory);

    let store = MemoryTaskStore::new();
    assert_eq!(seed_from_config(&store, &cfg).await?, 3);

    let order: Vec<String> = store.snapshot()?.into_iter().map(|t| t.id).collect();
    assert_eq!(order, vec!["build", "test", "deploy"]);

    // A second run against the same store is a no-op.
    assert_eq!(seed_from_config(&store, &cfg).await?, 0);
    assert_eq!(store.snapshot()?.len(), 3);
    Ok(())
}
