// src/graph/registry.rs

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use crate::config::model::{ConfigFile, TaskConfig};
use crate::errors::{AssetforgeError, Result};
use crate::exec::ExecRunner;
use crate::fs::FileSystem;
use crate::graph::TaskName;
use crate::pipeline::hash::HashStore;
use crate::pipeline::select::GlobSelector;
use crate::pipeline::step::PipelineStep;
use crate::pipeline::transform;

/// What a runner reports when its work finished without a hard error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerOutcome {
    /// All work done, nothing to report.
    Clean,
    /// A lint-style check found problems (non-fatal).
    Findings,
}

/// The executable body of a task.
///
/// Production bodies are [`PipelineRunner`] (built-in transform pipeline)
/// and [`ExecRunner`] (external tool via the shell); tests substitute
/// recording fakes.
pub trait TaskRunner: Send + Sync {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<RunnerOutcome>> + Send + '_>>;
}

/// A registered task: name, prerequisite edge list, runner.
#[derive(Clone)]
pub struct Task {
    pub name: TaskName,
    pub after: Vec<TaskName>,
    pub runner: Arc<dyn TaskRunner>,
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("after", &self.after)
            .finish_non_exhaustive()
    }
}

/// The registered task table.
///
/// Registration happens once during the configuration phase; afterwards the
/// registry is only read. It is an owned value (shared via `Arc` by the
/// orchestrator), not a process-wide singleton.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: HashMap<TaskName, Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task. Duplicate names are a configuration error.
    pub fn register(
        &mut self,
        name: impl Into<TaskName>,
        after: Vec<TaskName>,
        runner: Arc<dyn TaskRunner>,
    ) -> Result<()> {
        let name = name.into();
        if self.tasks.contains_key(&name) {
            return Err(AssetforgeError::ConfigError(format!(
                "task '{}' registered twice",
                name
            )));
        }
        self.tasks.insert(
            name.clone(),
            Task {
                name,
                after,
                runner,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TaskName, &Task)> {
        self.tasks.iter()
    }

    /// Build a registry from a validated config, wiring pipeline tasks to
    /// [`PipelineRunner`] and `cmd` tasks to [`ExecRunner`].
    pub fn from_config(
        cfg: &ConfigFile,
        fs: Arc<dyn FileSystem>,
        hash_store: Arc<Mutex<Box<dyn HashStore>>>,
    ) -> Result<Self> {
        let mut registry = Self::new();

        for (name, task) in cfg.tasks() {
            let runner: Arc<dyn TaskRunner> = if let Some(cmd) = &task.cmd {
                Arc::new(ExecRunner::new(name.clone(), cmd.clone(), task.lint))
            } else if task.src.is_some() {
                Arc::new(PipelineRunner::from_config(
                    name,
                    task,
                    cfg,
                    Arc::clone(&fs),
                    Arc::clone(&hash_store),
                )?)
            } else {
                // Aggregator: prerequisites only, nothing of its own to do.
                Arc::new(AggregateRunner)
            };

            registry.register(name.clone(), task.after.clone(), runner)?;
        }

        Ok(registry)
    }
}

/// Runner for aggregator tasks, which exist only for their `after` edges.
pub struct AggregateRunner;

impl TaskRunner for AggregateRunner {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<RunnerOutcome>> + Send + '_>> {
        Box::pin(async { Ok(RunnerOutcome::Clean) })
    }
}

/// Runner executing a built-in transform pipeline.
pub struct PipelineRunner {
    step: Arc<PipelineStep>,
    fs: Arc<dyn FileSystem>,
    source_root: PathBuf,
    dest_root: PathBuf,
    hash_store: Arc<Mutex<Box<dyn HashStore>>>,
}

impl PipelineRunner {
    pub fn new(
        step: PipelineStep,
        fs: Arc<dyn FileSystem>,
        source_root: PathBuf,
        dest_root: PathBuf,
        hash_store: Arc<Mutex<Box<dyn HashStore>>>,
    ) -> Self {
        Self {
            step: Arc::new(step),
            fs,
            source_root,
            dest_root,
            hash_store,
        }
    }

    fn from_config(
        name: &str,
        task: &TaskConfig,
        cfg: &ConfigFile,
        fs: Arc<dyn FileSystem>,
        hash_store: Arc<Mutex<Box<dyn HashStore>>>,
    ) -> Result<Self> {
        let includes = task.src.clone().unwrap_or_default();
        let excludes = task.exclude.clone().unwrap_or_default();
        let selector =
            GlobSelector::new(&includes, &excludes).map_err(AssetforgeError::Other)?;

        let mut transforms = Vec::with_capacity(task.steps.len());
        for spec in &task.steps {
            transforms.push(transform::from_spec(spec)?);
        }

        let step = PipelineStep::new(
            name,
            selector,
            transforms,
            task.dest.clone().unwrap_or_default(),
            task.skip_unchanged,
        );

        Ok(Self::new(
            step,
            fs,
            cfg.paths.source.clone(),
            cfg.paths.dest.clone(),
            hash_store,
        ))
    }
}

impl TaskRunner for PipelineRunner {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<RunnerOutcome>> + Send + '_>> {
        let step = Arc::clone(&self.step);
        let fs = Arc::clone(&self.fs);
        let source_root = self.source_root.clone();
        let dest_root = self.dest_root.clone();
        let hash_store = Arc::clone(&self.hash_store);

        Box::pin(async move {
            // File IO is blocking; keep it off the event loop.
            let joined = tokio::task::spawn_blocking(move || {
                step.run(fs.as_ref(), &source_root, &dest_root, &hash_store)
            })
            .await
            .map_err(|e| AssetforgeError::ConfigError(format!("pipeline task panicked: {e}")))?;

            joined.map(|_summary| RunnerOutcome::Clean)
        })
    }
}
