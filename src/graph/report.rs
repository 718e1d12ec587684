// src/graph/report.rs

//! Per-run outcome reporting.

use std::collections::HashMap;

use crate::graph::TaskName;

/// Terminal state of one task within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The task's work completed successfully.
    Success,
    /// A lint-style check completed and reported problems; non-fatal by
    /// policy, but the run's exit status must reflect it.
    Findings,
    /// The task's transform or command failed. Dependents are blocked.
    Failed(String),
    /// The task never ran because an upstream prerequisite failed.
    Blocked,
}

impl TaskOutcome {
    /// Whether dependents may proceed after this outcome.
    pub fn satisfies_dependents(&self) -> bool {
        matches!(self, TaskOutcome::Success | TaskOutcome::Findings)
    }
}

/// Result of a single `Orchestrator::run` invocation.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Tasks in completion order (blocked tasks appear when marked).
    order: Vec<TaskName>,
    outcomes: HashMap<TaskName, TaskOutcome>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, task: TaskName, outcome: TaskOutcome) {
        self.order.push(task.clone());
        self.outcomes.insert(task, outcome);
    }

    /// Completion order of this run.
    pub fn order(&self) -> &[TaskName] {
        &self.order
    }

    pub fn outcome_of(&self, task: &str) -> Option<&TaskOutcome> {
        self.outcomes.get(task)
    }

    /// Position of a task in the completion order, for ordering assertions.
    pub fn position_of(&self, task: &str) -> Option<usize> {
        self.order.iter().position(|t| t == task)
    }

    pub fn failed_tasks(&self) -> impl Iterator<Item = &TaskName> {
        self.outcomes.iter().filter_map(|(name, outcome)| {
            matches!(outcome, TaskOutcome::Failed(_) | TaskOutcome::Blocked).then_some(name)
        })
    }

    pub fn has_failures(&self) -> bool {
        self.failed_tasks().next().is_some()
    }

    pub fn has_findings(&self) -> bool {
        self.outcomes
            .values()
            .any(|o| matches!(o, TaskOutcome::Findings))
    }

    /// Process exit status for this run: non-zero when any transform error
    /// or lint finding occurred.
    pub fn exit_code(&self) -> i32 {
        if self.has_failures() || self.has_findings() {
            1
        } else {
            0
        }
    }
}
