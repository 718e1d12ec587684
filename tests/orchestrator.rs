use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use assetforge::errors::AssetforgeError;
use assetforge::graph::{
    Orchestrator, RunnerOutcome, TaskGraph, TaskOutcome, TaskRegistry, TaskRunner,
};
use assetforge_test_utils::fake_runner::{ExecutionLog, FakeBehaviour, FakeRunner};
use assetforge_test_utils::{init_tracing, with_timeout};

fn orchestrator_of(tasks: Vec<(&str, Vec<&str>, Arc<dyn TaskRunner>)>) -> Orchestrator {
    let edges: Vec<(String, Vec<String>)> = tasks
        .iter()
        .map(|(name, after, _)| {
            (
                name.to_string(),
                after.iter().map(|s| s.to_string()).collect(),
            )
        })
        .collect();

    let mut registry = TaskRegistry::new();
    for (name, after, runner) in tasks {
        registry
            .register(
                name,
                after.into_iter().map(|s| s.to_string()).collect(),
                runner,
            )
            .unwrap();
    }

    let graph = TaskGraph::from_edges(edges.iter().map(|(n, a)| (n.as_str(), a.as_slice())));
    Orchestrator::new(Arc::new(registry), graph)
}

#[tokio::test]
async fn diamond_runs_each_prerequisite_once_in_dependency_order() {
    init_tracing();
    let log = ExecutionLog::new();

    // A:[]  B:[A]  C:[A]  D:[B,C]
    let orch = orchestrator_of(vec![
        ("A", vec![], Arc::new(FakeRunner::new("A", log.clone()))),
        ("B", vec!["A"], Arc::new(FakeRunner::new("B", log.clone()))),
        ("C", vec!["A"], Arc::new(FakeRunner::new("C", log.clone()))),
        (
            "D",
            vec!["B", "C"],
            Arc::new(FakeRunner::new("D", log.clone())),
        ),
    ]);

    let report = with_timeout(orch.run("D")).await.unwrap();

    // Every transitive prerequisite ran exactly once.
    for task in ["A", "B", "C", "D"] {
        assert_eq!(log.run_count(task), 1, "task {task} should run once");
        assert_eq!(report.outcome_of(task), Some(&TaskOutcome::Success));
    }

    // A precedes B and C; both precede D. B and C may finish in either order.
    let pos = |t: &str| report.position_of(t).unwrap();
    assert!(pos("A") < pos("B"));
    assert!(pos("A") < pos("C"));
    assert!(pos("B") < pos("D"));
    assert!(pos("C") < pos("D"));

    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn shared_prerequisite_is_not_rerun_for_second_dependent() {
    init_tracing();
    let log = ExecutionLog::new();

    let orch = orchestrator_of(vec![
        (
            "common",
            vec![],
            Arc::new(FakeRunner::new("common", log.clone())),
        ),
        (
            "left",
            vec!["common"],
            Arc::new(FakeRunner::new("left", log.clone())),
        ),
        (
            "right",
            vec!["common", "left"],
            Arc::new(FakeRunner::new("right", log.clone())),
        ),
    ]);

    with_timeout(orch.run("right")).await.unwrap();
    assert_eq!(log.run_count("common"), 1);
}

#[tokio::test]
async fn independent_ready_tasks_run_concurrently() {
    init_tracing();
    let log = ExecutionLog::new();

    // Both roots sleep; with concurrent dispatch both start before either
    // finishes, so the whole run takes ~one delay, not two.
    let delay = Duration::from_millis(150);
    let orch = orchestrator_of(vec![
        (
            "B",
            vec![],
            Arc::new(FakeRunner::new("B", log.clone()).delay(delay)),
        ),
        (
            "C",
            vec![],
            Arc::new(FakeRunner::new("C", log.clone()).delay(delay)),
        ),
        (
            "D",
            vec!["B", "C"],
            Arc::new(FakeRunner::new("D", log.clone())),
        ),
    ]);

    let started = std::time::Instant::now();
    with_timeout(orch.run("D")).await.unwrap();
    let elapsed = started.elapsed();

    assert!(
        elapsed < delay * 2,
        "siblings should overlap (took {elapsed:?})"
    );
    assert_eq!(log.finished().last().map(String::as_str), Some("D"));
}

#[tokio::test]
async fn failure_blocks_dependents_but_not_sibling_branch() {
    init_tracing();
    let log = ExecutionLog::new();

    //        root
    //       /    \
    //   broken    ok
    //      |       |
    //   after_broken  after_ok
    let orch = orchestrator_of(vec![
        (
            "root",
            vec![],
            Arc::new(FakeRunner::new("root", log.clone())),
        ),
        (
            "broken",
            vec!["root"],
            Arc::new(FakeRunner::failing("broken", log.clone(), "boom")),
        ),
        (
            "ok",
            vec!["root"],
            Arc::new(FakeRunner::new("ok", log.clone())),
        ),
        (
            "after_broken",
            vec!["broken"],
            Arc::new(FakeRunner::new("after_broken", log.clone())),
        ),
        (
            "after_ok",
            vec!["ok"],
            Arc::new(FakeRunner::new("after_ok", log.clone())),
        ),
        (
            "all",
            vec!["after_broken", "after_ok"],
            Arc::new(FakeRunner::new("all", log.clone())),
        ),
    ]);

    let report = with_timeout(orch.run("all")).await.unwrap();

    // The sibling branch completed despite the failure next door.
    assert_eq!(report.outcome_of("ok"), Some(&TaskOutcome::Success));
    assert_eq!(report.outcome_of("after_ok"), Some(&TaskOutcome::Success));

    // The failing branch is failed/blocked, and nothing downstream ran.
    assert!(matches!(
        report.outcome_of("broken"),
        Some(TaskOutcome::Failed(_))
    ));
    assert_eq!(report.outcome_of("after_broken"), Some(&TaskOutcome::Blocked));
    assert_eq!(report.outcome_of("all"), Some(&TaskOutcome::Blocked));
    assert_eq!(log.run_count("after_broken"), 0);
    assert_eq!(log.run_count("all"), 0);

    assert!(report.has_failures());
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn lint_findings_set_exit_code_without_blocking_dependents() {
    init_tracing();
    let log = ExecutionLog::new();

    let orch = orchestrator_of(vec![
        (
            "lint",
            vec![],
            Arc::new(FakeRunner::new("lint", log.clone()).behaviour(FakeBehaviour::Findings)),
        ),
        (
            "package",
            vec!["lint"],
            Arc::new(FakeRunner::new("package", log.clone())),
        ),
    ]);

    let report = with_timeout(orch.run("package")).await.unwrap();

    assert_eq!(report.outcome_of("lint"), Some(&TaskOutcome::Findings));
    assert_eq!(report.outcome_of("package"), Some(&TaskOutcome::Success));
    assert!(!report.has_failures());
    assert!(report.has_findings());
    assert_eq!(report.exit_code(), 1);
}

struct PanickingRunner;

impl TaskRunner for PanickingRunner {
    fn run(&self) -> Pin<Box<dyn Future<Output = assetforge::errors::Result<RunnerOutcome>> + Send + '_>> {
        Box::pin(async { panic!("runner blew up") })
    }
}

#[tokio::test]
async fn panicking_runner_fails_its_task_and_blocks_dependents() {
    init_tracing();
    let log = ExecutionLog::new();

    let orch = orchestrator_of(vec![
        ("panicky", vec![], Arc::new(PanickingRunner)),
        (
            "dependent",
            vec!["panicky"],
            Arc::new(FakeRunner::new("dependent", log.clone())),
        ),
        (
            "sibling",
            vec![],
            Arc::new(FakeRunner::new("sibling", log.clone())),
        ),
        (
            "all",
            vec!["dependent", "sibling"],
            Arc::new(FakeRunner::new("all", log.clone())),
        ),
    ]);

    let report = with_timeout(orch.run("all")).await.unwrap();

    assert!(matches!(
        report.outcome_of("panicky"),
        Some(TaskOutcome::Failed(_))
    ));
    assert_eq!(report.outcome_of("dependent"), Some(&TaskOutcome::Blocked));
    assert_eq!(log.run_count("dependent"), 0);

    // The unrelated branch still completed.
    assert_eq!(report.outcome_of("sibling"), Some(&TaskOutcome::Success));

    assert!(report.has_failures());
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn unknown_task_is_rejected_before_anything_runs() {
    init_tracing();
    let log = ExecutionLog::new();

    let orch = orchestrator_of(vec![(
        "only",
        vec![],
        Arc::new(FakeRunner::new("only", log.clone())),
    )]);

    let err = orch.run("missing").await.unwrap_err();
    assert!(matches!(err, AssetforgeError::UnknownTask(_)));
    assert!(log.started().is_empty());
}

#[tokio::test]
async fn resolve_order_detects_cycles_defensively() {
    init_tracing();
    let log = ExecutionLog::new();

    // Cycles are normally rejected by config validation; the orchestrator
    // still refuses a registry assembled with one by hand.
    let orch = orchestrator_of(vec![
        (
            "a",
            vec!["b"],
            Arc::new(FakeRunner::new("a", log.clone())),
        ),
        (
            "b",
            vec!["a"],
            Arc::new(FakeRunner::new("b", log.clone())),
        ),
    ]);

    let err = orch.run("a").await.unwrap_err();
    assert!(matches!(err, AssetforgeError::DagCycle(_)));
    assert!(log.started().is_empty());
}
