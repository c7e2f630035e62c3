// src/dag/graph.rs

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::TaskConfig;
use crate::errors::{Result, TaskgateError};
use crate::types::TaskId;

/// Dependency graph over a batch of task declarations (the `[task.<id>]`
/// sections of a config file).
///
/// Edge direction is dependency -> dependent, so for
///
/// ```toml
/// [task.test]
/// after = ["build"]
/// ```
///
/// we add `build -> test`.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    deps: BTreeMap<TaskId, Vec<TaskId>>,
}

impl DependencyGraph {
    pub fn from_tasks(tasks: &BTreeMap<TaskId, TaskConfig>) -> Self {
        let deps = tasks
            .iter()
            .map(|(id, task)| (id.clone(), task.after.clone()))
            .collect();
        Self { deps }
    }

    /// Immediate dependencies of a task (its `after` list).
    pub fn dependencies_of(&self, id: &str) -> &[TaskId] {
        self.deps.get(id).map(|d| d.as_slice()).unwrap_or(&[])
    }

    /// Tasks with no dependencies.
    pub fn roots(&self) -> Vec<TaskId> {
        self.deps
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Every `after` entry must name another declared task.
    pub fn check_references(&self) -> Result<()> {
        for (id, deps) in self.deps.iter() {
            for dep in deps {
                if dep == id {
                    return Err(TaskgateError::ConfigError(format!(
                        "task '{}' cannot depend on itself in `after`",
                        id
                    )));
                }
                if !self.deps.contains_key(dep) {
                    return Err(TaskgateError::ConfigError(format!(
                        "task '{}' has unknown dependency '{}' in `after`",
                        id, dep
                    )));
                }
            }
        }
        Ok(())
    }

    /// Order tasks so that every task comes after all of its dependencies.
    /// Fails with [`TaskgateError::DagCycle`] on a cycle.
    pub fn topological_order(&self) -> Result<Vec<TaskId>> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for id in self.deps.keys() {
            graph.add_node(id.as_str());
        }

        for (id, deps) in self.deps.iter() {
            for dep in deps {
                graph.add_edge(dep.as_str(), id.as_str(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
            Err(cycle) => Err(TaskgateError::DagCycle(format!(
                "cycle detected in task dependencies involving task '{}'",
                cycle.node_id()
            ))),
        }
    }
}
