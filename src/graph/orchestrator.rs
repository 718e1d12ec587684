// src/graph/orchestrator.rs

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::errors::{AssetforgeError, Result};
use crate::graph::graph::TaskGraph;
use crate::graph::registry::{RunnerOutcome, TaskRegistry};
use crate::graph::report::{RunReport, TaskOutcome};
use crate::graph::TaskName;

/// Per-run state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Pending,
    Running,
    Done,
}

/// Executes a requested task and all of its transitive prerequisites,
/// at most once each, in an order consistent with the dependency graph.
///
/// Ready tasks (prerequisites satisfied) are dispatched concurrently; a
/// failure marks all transitive dependents in the run as blocked while
/// sibling branches finish independently. There are no retries.
#[derive(Debug)]
pub struct Orchestrator {
    registry: Arc<TaskRegistry>,
    graph: TaskGraph,
}

impl Orchestrator {
    pub fn new(registry: Arc<TaskRegistry>, graph: TaskGraph) -> Self {
        Self { registry, graph }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Resolve the transitive prerequisite closure of `entry` into a
    /// topologically ordered sequence with no duplicates.
    ///
    /// Fails with `UnknownTask` for unregistered names and, defensively,
    /// with `DagCycle` if resolution revisits a task still in progress
    /// (config validation should have rejected cycles already).
    pub fn resolve_order(&self, entry: &str) -> Result<Vec<TaskName>> {
        #[derive(PartialEq)]
        enum Mark {
            InProgress,
            Done,
        }

        fn visit(
            name: &str,
            registry: &TaskRegistry,
            marks: &mut HashMap<TaskName, Mark>,
            order: &mut Vec<TaskName>,
        ) -> Result<()> {
            match marks.get(name) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::InProgress) => {
                    return Err(AssetforgeError::DagCycle(format!(
                        "task '{}' is part of a prerequisite cycle",
                        name
                    )));
                }
                None => {}
            }

            let task = registry
                .get(name)
                .ok_or_else(|| AssetforgeError::UnknownTask(name.to_string()))?;

            marks.insert(name.to_string(), Mark::InProgress);
            for dep in &task.after {
                visit(dep, registry, marks, order)?;
            }
            marks.insert(name.to_string(), Mark::Done);
            order.push(name.to_string());
            Ok(())
        }

        let mut marks = HashMap::new();
        let mut order = Vec::new();
        visit(entry, &self.registry, &mut marks, &mut order)?;
        Ok(order)
    }

    /// Run `entry` and its transitive prerequisites.
    ///
    /// Transform and command failures are recorded in the returned
    /// [`RunReport`] rather than surfaced as `Err`; `Err` is reserved for
    /// unknown tasks and cycle detection.
    pub async fn run(&self, entry: &str) -> Result<RunReport> {
        let order = self.resolve_order(entry)?;
        info!(entry = %entry, tasks = order.len(), "starting run");

        let mut state: HashMap<TaskName, RunState> = order
            .iter()
            .map(|name| (name.clone(), RunState::Pending))
            .collect();

        let mut report = RunReport::new();
        let mut join_set: JoinSet<(TaskName, Result<RunnerOutcome>)> = JoinSet::new();
        // Maps join handle ids back to task names, so a panicking runner can
        // still be attributed to its task.
        let mut spawned: HashMap<tokio::task::Id, TaskName> = HashMap::new();

        loop {
            self.dispatch_ready(&order, &mut state, &report, &mut join_set, &mut spawned);

            let Some(joined) = join_set.join_next().await else {
                break;
            };

            let (name, result) = match joined {
                Ok(pair) => pair,
                Err(join_err) => {
                    // A runner panic fails its task like any other error;
                    // sibling branches keep running.
                    match spawned.get(&join_err.id()) {
                        Some(name) => {
                            let err = anyhow::anyhow!("task '{name}' panicked: {join_err}");
                            (name.clone(), Err(AssetforgeError::Other(err)))
                        }
                        None => {
                            warn!(error = %join_err, "join error for untracked task");
                            continue;
                        }
                    }
                }
            };

            state.insert(name.clone(), RunState::Done);

            match result {
                Ok(RunnerOutcome::Clean) => {
                    debug!(task = %name, "task completed");
                    report.record(name, TaskOutcome::Success);
                }
                Ok(RunnerOutcome::Findings) => {
                    info!(task = %name, "check completed with findings");
                    report.record(name, TaskOutcome::Findings);
                }
                Err(err) => {
                    warn!(task = %name, error = %err, "task failed; blocking dependents");
                    report.record(name.clone(), TaskOutcome::Failed(err.to_string()));
                    self.block_dependents(&name, &mut state, &mut report);
                }
            }
        }

        info!(
            entry = %entry,
            failed = report.has_failures(),
            findings = report.has_findings(),
            "run finished"
        );
        Ok(report)
    }

    /// Dispatch every pending task whose prerequisites are all satisfied.
    fn dispatch_ready(
        &self,
        order: &[TaskName],
        state: &mut HashMap<TaskName, RunState>,
        report: &RunReport,
        join_set: &mut JoinSet<(TaskName, Result<RunnerOutcome>)>,
        spawned: &mut HashMap<tokio::task::Id, TaskName>,
    ) {
        for name in order {
            if state.get(name) != Some(&RunState::Pending) {
                continue;
            }

            let task = match self.registry.get(name) {
                Some(t) => t,
                None => continue,
            };

            let satisfied = task.after.iter().all(|dep| {
                report
                    .outcome_of(dep)
                    .is_some_and(|o| o.satisfies_dependents())
            });
            if !satisfied {
                continue;
            }

            debug!(task = %name, "prerequisites satisfied; dispatching");
            state.insert(name.clone(), RunState::Running);

            let runner = Arc::clone(&task.runner);
            let task_name = name.clone();
            let handle = join_set.spawn(async move {
                let result = runner.run().await;
                (task_name, result)
            });
            spawned.insert(handle.id(), name.clone());
        }
    }

    /// Mark every transitive dependent of `failed` that participates in
    /// this run as blocked.
    fn block_dependents(
        &self,
        failed: &str,
        state: &mut HashMap<TaskName, RunState>,
        report: &mut RunReport,
    ) {
        let mut stack: Vec<TaskName> = self.graph.dependents_of(failed).to_vec();

        while let Some(name) = stack.pop() {
            if state.get(&name) == Some(&RunState::Pending) {
                debug!(task = %name, upstream = %failed, "blocked by upstream failure");
                state.insert(name.clone(), RunState::Done);
                report.record(name.clone(), TaskOutcome::Blocked);
                stack.extend(self.graph.dependents_of(&name).iter().cloned());
            }
        }
    }
}
