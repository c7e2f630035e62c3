use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use taskgate::config::{load_and_validate, parse_config};
use taskgate::errors::TaskgateError;
use taskgate::types::{StartupLoadPolicy, StorageMode};
use taskgate_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn empty_file_uses_defaults() -> TestResult {
    let file = write_config("");
    let cfg = load_and_validate(file.path())?;

    assert_eq!(cfg.scheduler.max_concurrent_tasks, 4);
    assert_eq!(cfg.scheduler.polling_interval_ms, 1000);
    assert_eq!(cfg.scheduler.startup_load, StartupLoadPolicy::FailOpen);
    assert_eq!(cfg.store.mode, StorageMode::File);
    assert_eq!(cfg.store.path, PathBuf::from(".taskgate/tasks.json"));
    assert!(cfg.task.is_empty());
    Ok(())
}

#[test]
fn full_config_is_parsed() -> TestResult {
    let file = write_config(
        r#"
[scheduler]
max_concurrent_tasks = 2
polling_interval_ms = 250
startup_load = "fail_closed"

[store]
mode = "memory"

[task.build]
type = "compile"
duration_ms = 200

[task.test]
type = "test"
duration_ms = 100
after = ["build"]
"#,
    );

    let cfg = load_and_validate(file.path())?;

    assert_eq!(cfg.scheduler.max_concurrent_tasks, 2);
    assert_eq!(cfg.scheduler.polling_interval_ms, 250);
    assert_eq!(cfg.scheduler.startup_load, StartupLoadPolicy::FailClosed);
    assert_eq!(cfg.store.mode, StorageMode::Memory);

    let test = &cfg.task["test"];
    assert_eq!(test.task_type, "test");
    assert_eq!(test.duration_ms, 100);
    assert_eq!(test.after, vec!["build".to_string()]);
    Ok(())
}

#[test]
fn dag_cycle_returns_structured_error() {
    let file = write_config(
        r#"
[task.A]
type = "t"
duration_ms = 1
after = ["B"]

[task.B]
type = "t"
duration_ms = 1
after = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(TaskgateError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains('A') || msg.contains('B'));
        }
        other => panic!("expected DagCycle, got {other:?}"),
    }
}

#[test]
fn unknown_dependency_is_rejected() {
    let file = write_config(
        r#"
[task.test]
type = "test"
duration_ms = 5
after = ["build"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(TaskgateError::ConfigError(msg)) => {
            assert!(msg.contains("unknown dependency 'build'"), "{msg}");
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn self_dependency_is_rejected() {
    let result = ConfigFileBuilder::new()
        .with_task("a", TaskConfigBuilder::new("t", 5).after("a").build())
        .try_build();

    match result {
        Err(TaskgateError::ConfigError(msg)) => assert!(msg.contains("itself"), "{msg}"),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn zero_concurrency_is_rejected() {
    let result = ConfigFileBuilder::new().max_concurrent_tasks(0).try_build();

    match result {
        Err(TaskgateError::ConfigError(msg)) => {
            assert!(msg.contains("max_concurrent_tasks"), "{msg}");
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn zero_polling_interval_is_rejected() {
    let result = ConfigFileBuilder::new().polling_interval_ms(0).try_build();
    assert!(matches!(result, Err(TaskgateError::ConfigError(_))));
}

#[test]
fn zero_duration_seed_task_is_rejected() {
    let result = ConfigFileBuilder::new()
        .with_task("a", TaskConfigBuilder::new("t", 0).build())
        .try_build();

    match result {
        Err(TaskgateError::ConfigError(msg)) => assert!(msg.contains("duration_ms"), "{msg}"),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn empty_type_is_rejected() {
    let result = ConfigFileBuilder::new()
        .with_task("a", TaskConfigBuilder::new("  ", 5).build())
        .try_build();
    assert!(matches!(result, Err(TaskgateError::ConfigError(_))));
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let file = write_config("[scheduler\nmax_concurrent_tasks = ");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(TaskgateError::TomlError(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("nope.toml"));
    assert!(matches!(result, Err(TaskgateError::IoError(_))));
}

#[test]
fn inline_text_goes_through_the_same_validation() -> TestResult {
    let cfg = parse_config(
        r#"
[task.only]
type = "noop"
duration_ms = 1
"#,
    )?;
    assert_eq!(cfg.task.len(), 1);

    let err = parse_config("[scheduler]\nmax_concurrent_tasks = 0\n").unwrap_err();
    assert!(matches!(err, TaskgateError::ConfigError(_)));
    Ok(())
}
