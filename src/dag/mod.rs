// src/dag/mod.rs

//! Dependency tracking.
//!
//! - [`resolver`] owns the completed-set and decides which queued tasks are
//!   eligible to run.
//! - [`graph`] checks a batch of task declarations for unknown dependencies
//!   and cycles before they reach the store.

pub mod graph;
pub mod resolver;

pub use graph::DependencyGraph;
pub use resolver::DependencyResolver;
