// src/graph/mod.rs

//! Task graph and orchestration.
//!
//! - [`graph`] holds the explicit dependency graph of tasks.
//! - [`registry`] is the registered task table (name, edges, runner).
//! - [`orchestrator`] resolves a requested task into a topological order
//!   and executes it, dispatching independent ready tasks concurrently.
//! - [`report`] collects per-task outcomes and the run's exit status.

pub mod graph;
pub mod orchestrator;
pub mod registry;
pub mod report;

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

pub use graph::TaskGraph;
pub use orchestrator::Orchestrator;
pub use registry::{RunnerOutcome, Task, TaskRegistry, TaskRunner};
pub use report::{RunReport, TaskOutcome};
