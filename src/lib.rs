// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod store;
pub mod types;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::{default_config_path, load_and_validate};
use crate::config::model::ConfigFile;
use crate::dag::DependencyGraph;
use crate::engine::{Scheduler, SchedulerEvent, SchedulerOptions, backlog};
use crate::exec::SimulatedRunner;
use crate::store::{TaskStore, open_store, seed_from_config};
use crate::types::{TaskId, TaskStatus};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the task store and config seeding
/// - the scheduler with the simulated runner
/// - Ctrl-C handling and the optional exit-when-idle check
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let mut cfg = load_and_validate(&config_path)?;
    apply_overrides(&mut cfg, &args)?;

    if args.dry_run {
        print_dry_run(&cfg)?;
        return Ok(());
    }

    let root_dir = config_root_dir(&config_path);
    let store = open_store(&cfg.store, &root_dir)?;

    let seeded = seed_from_config(store.as_ref(), &cfg).await?;
    info!(seeded, declared = cfg.task.len(), "seed tasks queued");

    // Nothing in this process owns these; they stay RUNNING in the store.
    let orphaned: HashSet<TaskId> = store
        .find_by_status(TaskStatus::Running)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();
    if !orphaned.is_empty() {
        warn!(
            tasks = ?orphaned,
            "store holds RUNNING tasks from an earlier run; they will not be resumed"
        );
    }

    let options = SchedulerOptions::from_config(&cfg.scheduler);
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<SchedulerEvent>();
    let mut scheduler = Scheduler::new(
        Arc::clone(&store),
        Arc::new(SimulatedRunner),
        options,
        events_tx,
    );

    scheduler.start().await?;

    let waited = wait_for_exit(
        store.as_ref(),
        &mut events_rx,
        args.exit_when_idle,
        &orphaned,
        options.polling_interval,
    )
    .await;

    scheduler.stop().await?;

    while let Ok(event) = events_rx.try_recv() {
        log_event(&event);
    }

    waited
}

/// Apply `--max-concurrent`, `--poll-interval-ms` and `--startup-load` on top
/// of the loaded config.
pub fn apply_overrides(cfg: &mut ConfigFile, args: &CliArgs) -> Result<()> {
    if let Some(max) = args.max_concurrent {
        if max == 0 {
            bail!("--max-concurrent must be >= 1 (got 0)");
        }
        cfg.scheduler.max_concurrent_tasks = max;
    }

    if let Some(ms) = args.poll_interval_ms {
        if ms == 0 {
            bail!("--poll-interval-ms must be > 0 (got 0)");
        }
        cfg.scheduler.polling_interval_ms = ms;
    }

    if let Some(policy) = args.startup_load {
        cfg.scheduler.startup_load = policy;
    }

    Ok(())
}

/// Block until Ctrl-C, or until the store reports nothing left to do when
/// `exit_when_idle` is set. `orphaned` tasks do not count as running.
/// Scheduler events are logged as they arrive.
async fn wait_for_exit(
    store: &dyn TaskStore,
    events: &mut mpsc::UnboundedReceiver<SchedulerEvent>,
    exit_when_idle: bool,
    orphaned: &HashSet<TaskId>,
    check_interval: Duration,
) -> Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut idle_check = tokio::time::interval(check_interval);
    idle_check.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                if let Err(e) = res {
                    warn!(error = %e, "failed to listen for Ctrl+C; stopping");
                } else {
                    info!("Ctrl+C received; stopping scheduler");
                }
                return Ok(());
            }

            Some(event) = events.recv() => {
                log_event(&event);
            }

            _ = idle_check.tick(), if exit_when_idle => {
                match backlog(store).await {
                    Ok(b) if b.is_idle_except(orphaned) => {
                        if !b.blocked.is_empty() {
                            warn!(
                                blocked = ?b.blocked,
                                "exiting with tasks whose dependencies never completed"
                            );
                        }
                        info!("no runnable or running tasks left; stopping scheduler");
                        return Ok(());
                    }
                    Ok(b) => {
                        debug!(running = b.running.len(), runnable = b.runnable, "still busy");
                    }
                    Err(err) => {
                        warn!(error = %err, "failed to read backlog; will retry");
                    }
                }
            }
        }
    }
}

fn log_event(event: &SchedulerEvent) {
    match event {
        SchedulerEvent::TaskStarted(task) => {
            info!(task = %task.id, task_type = %task.task_type, "started");
        }
        SchedulerEvent::TaskCompleted(task) => info!(task = %task.id, "completed"),
        SchedulerEvent::TaskFailed { task, reason } => {
            warn!(task = %task.id, reason = %reason, "failed");
        }
        SchedulerEvent::TaskCancelled { id } => warn!(task = %id, "cancelled"),
    }
}

/// Directory that relative store paths are resolved against.
///
/// - If the config path has a non-empty parent (e.g. "configs/Taskgate.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Taskgate.toml" (parent = ""),
///   we fall back to the current working directory "."
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Simple dry-run output: scheduler settings, store, and seed tasks in the
/// order they would become runnable.
fn print_dry_run(cfg: &ConfigFile) -> Result<()> {
    println!("taskgate dry-run");
    println!(
        "  scheduler.max_concurrent_tasks = {}",
        cfg.scheduler.max_concurrent_tasks
    );
    println!(
        "  scheduler.polling_interval_ms = {}",
        cfg.scheduler.polling_interval_ms
    );
    println!("  scheduler.startup_load = {:?}", cfg.scheduler.startup_load);
    println!("  store.mode = {:?}", cfg.store.mode);
    println!("  store.path = {}", cfg.store.path.display());
    println!();

    let graph = DependencyGraph::from_tasks(&cfg.task);
    let order = graph.topological_order()?;

    println!("tasks ({}):", cfg.task.len());
    for id in order {
        let Some(task) = cfg.task.get(&id) else {
            continue;
        };
        println!("  - {id}");
        println!("      type: {}", task.task_type);
        println!("      duration_ms: {}", task.duration_ms);
        let after = graph.dependencies_of(&id);
        if !after.is_empty() {
            println!("      after: {after:?}");
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
