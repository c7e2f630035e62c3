// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::StartupLoadPolicy;

/// Command-line arguments for `taskgate`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskgate",
    version,
    about = "Run queued tasks once their dependencies have completed, with bounded concurrency.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Taskgate.toml` in the current working directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKGATE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the seed plan, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Override `[scheduler].max_concurrent_tasks`.
    #[arg(long, value_name = "N")]
    pub max_concurrent: Option<usize>,

    /// Override `[scheduler].polling_interval_ms`.
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Override `[scheduler].startup_load` (fail-open or fail-closed).
    #[arg(long, value_name = "POLICY", value_parser = parse_startup_load)]
    pub startup_load: Option<StartupLoadPolicy>,

    /// Stop and exit once nothing is running and no queued task can start.
    #[arg(long)]
    pub exit_when_idle: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_startup_load(s: &str) -> Result<StartupLoadPolicy, String> {
    s.parse()
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
