use proptest::prelude::*;
use taskgate::dag::DependencyResolver;
use taskgate::types::TaskStatus;
use taskgate_test_utils::builders::TaskBuilder;

#[test]
fn task_without_dependencies_is_eligible() {
    let resolver = DependencyResolver::new();
    let task = TaskBuilder::new("a").build();

    assert!(resolver.is_eligible_to_run(&task));
}

#[test]
fn task_waits_for_every_dependency() {
    let mut resolver = DependencyResolver::new();
    let task = TaskBuilder::new("c").after("a").after("b").build();

    assert!(!resolver.is_eligible_to_run(&task));

    resolver.register_completed_task("a");
    assert!(!resolver.is_eligible_to_run(&task), "b is still missing");

    resolver.register_completed_task("b");
    assert!(resolver.is_eligible_to_run(&task));
}

#[test]
fn running_and_completed_tasks_are_never_eligible() {
    let resolver = DependencyResolver::new();

    let running = TaskBuilder::new("r").status(TaskStatus::Running).build();
    let completed = TaskBuilder::new("c").status(TaskStatus::Completed).build();

    assert!(!resolver.is_eligible_to_run(&running));
    assert!(!resolver.is_eligible_to_run(&completed));
}

#[test]
fn failed_task_with_satisfied_dependencies_reports_eligible() {
    // Status filtering only excludes RUNNING and COMPLETED; the scheduler
    // never offers FAILED tasks because it only queries QUEUED ones.
    let mut resolver = DependencyResolver::new();
    resolver.register_completed_task("a");

    let failed = TaskBuilder::new("f")
        .after("a")
        .status(TaskStatus::Failed)
        .build();

    assert!(resolver.is_eligible_to_run(&failed));
}

#[test]
fn registering_twice_is_idempotent() {
    let mut resolver = DependencyResolver::new();
    resolver.register_completed_task("a");
    resolver.register_completed_task("a");

    assert_eq!(resolver.completed_count(), 1);
    assert!(resolver.is_completed("a"));
}

#[test]
fn load_completed_tasks_extends_existing_set() {
    let mut resolver = DependencyResolver::new();
    resolver.register_completed_task("a");
    resolver.load_completed_tasks(vec!["b", "c", "a"]);

    assert_eq!(resolver.completed_count(), 3);
    for id in ["a", "b", "c"] {
        assert!(resolver.is_completed(id));
    }

    resolver.reset();
    assert_eq!(resolver.completed_count(), 0);
}

#[test]
fn eligible_tasks_keeps_input_order() {
    let mut resolver = DependencyResolver::new();
    resolver.register_completed_task("done");

    let tasks = vec![
        TaskBuilder::new("z").build(),
        TaskBuilder::new("blocked").after("missing").build(),
        TaskBuilder::new("m").after("done").build(),
        TaskBuilder::new("a").build(),
    ];

    let eligible: Vec<String> = resolver
        .eligible_tasks(&tasks)
        .into_iter()
        .map(|t| t.id)
        .collect();

    assert_eq!(eligible, vec!["z", "m", "a"]);
}

proptest! {
    /// A queued task is eligible exactly when every dependency is registered.
    #[test]
    fn eligibility_matches_subset_check(
        deps in proptest::collection::hash_set(0..12usize, 0..6),
        completed in proptest::collection::hash_set(0..12usize, 0..12),
    ) {
        let mut resolver = DependencyResolver::new();
        resolver.load_completed_tasks(completed.iter().map(|i| format!("t{i}")));

        let task = deps
            .iter()
            .fold(TaskBuilder::new("target"), |b, i| b.after(&format!("t{i}")))
            .build();

        let expected = deps.is_subset(&completed);
        prop_assert_eq!(resolver.is_eligible_to_run(&task), expected);
    }
}
