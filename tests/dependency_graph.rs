use std::collections::HashMap;

use proptest::prelude::*;
use taskgate::dag::DependencyGraph;
use taskgate::errors::TaskgateError;
use taskgate_test_utils::builders::task_map;

#[test]
fn topological_order_puts_dependencies_first() {
    let tasks = task_map(&[
        ("deploy", &["test", "lint"]),
        ("test", &["build"]),
        ("lint", &[]),
        ("build", &[]),
    ]);
    let graph = DependencyGraph::from_tasks(&tasks);

    let order = graph.topological_order().unwrap();
    let pos: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    assert_eq!(order.len(), 4);
    assert!(pos["build"] < pos["test"]);
    assert!(pos["test"] < pos["deploy"]);
    assert!(pos["lint"] < pos["deploy"]);
}

#[test]
fn roots_are_tasks_without_dependencies() {
    let tasks = task_map(&[("a", &[]), ("b", &["a"]), ("c", &[])]);
    let graph = DependencyGraph::from_tasks(&tasks);

    assert_eq!(graph.roots(), vec!["a".to_string(), "c".to_string()]);
    assert_eq!(graph.dependencies_of("b"), &["a".to_string()]);
    assert!(graph.dependencies_of("unknown").is_empty());
}

#[test]
fn three_node_cycle_is_detected() {
    let tasks = task_map(&[("a", &["c"]), ("b", &["a"]), ("c", &["b"])]);
    let graph = DependencyGraph::from_tasks(&tasks);

    assert!(graph.check_references().is_ok());
    assert!(matches!(
        graph.topological_order(),
        Err(TaskgateError::DagCycle(_))
    ));
}

proptest! {
    /// Graphs whose edges only point to lower-numbered tasks are acyclic, and
    /// the order respects every edge.
    #[test]
    fn forward_only_graphs_sort(raw in proptest::collection::vec(
        proptest::collection::vec(any::<usize>(), 0..4), 1..10)
    ) {
        let names: Vec<String> = (0..raw.len()).map(|i| format!("t{i}")).collect();
        let deps: Vec<Vec<String>> = raw
            .iter()
            .enumerate()
            .map(|(i, picks)| {
                let mut d: Vec<String> = if i == 0 {
                    Vec::new()
                } else {
                    picks.iter().map(|p| names[p % i].clone()).collect()
                };
                d.sort();
                d.dedup();
                d
            })
            .collect();

        let entries: Vec<(&str, Vec<&str>)> = names
            .iter()
            .zip(deps.iter())
            .map(|(n, d)| (n.as_str(), d.iter().map(String::as_str).collect()))
            .collect();
        let borrowed: Vec<(&str, &[&str])> =
            entries.iter().map(|(n, d)| (*n, d.as_slice())).collect();

        let graph = DependencyGraph::from_tasks(&task_map(&borrowed));
        prop_assert!(graph.check_references().is_ok());

        let order = graph.topological_order().unwrap();
        let pos: HashMap<&str, usize> =
            order.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();

        for (name, d) in names.iter().zip(deps.iter()) {
            for dep in d {
                prop_assert!(pos[dep.as_str()] < pos[name.as_str()]);
            }
        }
    }
}
