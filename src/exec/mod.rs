// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`runner`] provides the `TaskRunner` trait that performs a task's work,
//!   plus the `SimulatedRunner` used by the binary.
//! - [`pool`] owns the active-run table and enforces the concurrency ceiling,
//!   reporting lifecycle changes as `PoolEvent`s.

pub mod pool;
pub mod runner;

pub use pool::{ExecutionPool, PoolEvent};
pub use runner::{SimulatedRunner, TaskRunner};
