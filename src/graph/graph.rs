// src/graph/graph.rs

use std::collections::HashMap;

use crate::config::model::ConfigFile;
use crate::graph::TaskName;

/// Internal node structure: stores immediate prerequisites and dependents.
#[derive(Debug, Clone)]
struct GraphNode {
    /// Direct prerequisites: tasks that must complete before this one runs.
    after: Vec<TaskName>,
    /// Direct dependents: tasks that list this one in their `after`.
    dependents: Vec<TaskName>,
}

/// Explicit in-memory task graph keyed by task name.
///
/// Acyclicity and reference validity are checked in `config::validate`
/// before a `ConfigFile` exists, so this type only keeps adjacency
/// information for scheduling and diagnostics. It is an owned value passed
/// to the orchestrator, never process-wide state.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    nodes: HashMap<TaskName, GraphNode>,
}

impl TaskGraph {
    /// Build a graph from `(name, after)` pairs.
    pub fn from_edges<'a, I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [String])>,
    {
        let mut nodes: HashMap<TaskName, GraphNode> = HashMap::new();

        for (name, after) in edges {
            nodes.insert(
                name.to_string(),
                GraphNode {
                    after: after.to_vec(),
                    dependents: Vec::new(),
                },
            );
        }

        // Second pass: populate dependents based on prerequisites.
        let task_names: Vec<TaskName> = nodes.keys().cloned().collect();
        for task_name in task_names {
            let after = nodes
                .get(&task_name)
                .map(|n| n.after.clone())
                .unwrap_or_default();

            for dep in after {
                if let Some(dep_node) = nodes.get_mut(&dep) {
                    dep_node.dependents.push(task_name.clone());
                }
            }
        }

        Self { nodes }
    }

    /// Build a graph from a validated [`ConfigFile`].
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self::from_edges(
            cfg.task
                .iter()
                .map(|(name, task)| (name.as_str(), task.after.as_slice())),
        )
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// All task names.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    /// Immediate prerequisites of a task (the tasks listed in its `after`).
    pub fn prerequisites_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.after.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }
}
