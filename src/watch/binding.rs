// src/watch/binding.rs

use std::fmt;

use anyhow::{Context, Result};

use crate::config::model::ConfigFile;
use crate::graph::TaskName;
use crate::pipeline::select::GlobSelector;

/// A mapping from a compiled glob selector to the tasks to re-run when a
/// matching file changes.
///
/// Bindings are built once when the watch loop starts and held for the
/// lifetime of the process.
#[derive(Clone)]
pub struct WatchBinding {
    tasks: Vec<TaskName>,
    selector: GlobSelector,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("tasks", &self.tasks)
            .field("globs", &self.selector.includes())
            .finish()
    }
}

impl WatchBinding {
    pub fn new(tasks: Vec<TaskName>, selector: GlobSelector) -> Self {
        Self { tasks, selector }
    }

    pub fn tasks(&self) -> &[TaskName] {
        &self.tasks
    }

    /// Whether a root-relative path should re-trigger this binding.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.selector.matches(rel_path)
    }
}

/// Build one binding per watched task from a validated config.
///
/// Pipeline tasks default to watching their `src` globs; `cmd` tasks are
/// only bound when they declare `watch` explicitly.
pub fn build_watch_bindings(cfg: &ConfigFile) -> Result<Vec<WatchBinding>> {
    let mut bindings = Vec::new();

    for (name, task) in cfg.tasks() {
        let Some(watch) = task.effective_watch() else {
            continue;
        };

        let selector = GlobSelector::new(watch, task.effective_watch_exclude())
            .with_context(|| format!("building watch selector for task {name}"))?;

        bindings.push(WatchBinding::new(vec![name.clone()], selector));
    }

    Ok(bindings)
}
