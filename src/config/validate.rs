// src/config/validate.rs

use std::collections::HashMap;
use std::path::PathBuf;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile, StepSpec, TaskConfig};
use crate::errors::{AssetforgeError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AssetforgeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.paths, raw.watch, raw.task))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_watch_section(cfg)?;
    validate_task_bodies(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_dag(cfg)?;
    validate_output_collisions(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(AssetforgeError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_watch_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.debounce_ms == 0 {
        return Err(AssetforgeError::ConfigError(
            "[watch].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

/// A task body is either `cmd` or a pipeline (`src` + optional steps/dest).
/// A task with neither is an aggregator and must name at least one
/// prerequisite, otherwise running it would be a no-op.
fn validate_task_bodies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        match (&task.cmd, &task.src) {
            (Some(_), Some(_)) => {
                return Err(AssetforgeError::ConfigError(format!(
                    "task '{}' declares both `cmd` and `src`; a task body is one or the other",
                    name
                )));
            }
            (None, None) if task.after.is_empty() => {
                return Err(AssetforgeError::ConfigError(format!(
                    "task '{}' has no body and no prerequisites; declare `cmd`, `src` or `after`",
                    name
                )));
            }
            _ => {}
        }

        if task.src.is_none() && !task.steps.is_empty() {
            return Err(AssetforgeError::ConfigError(format!(
                "task '{}' declares `steps` but no `src` globs to feed them",
                name
            )));
        }

        if task.lint && task.cmd.is_none() {
            return Err(AssetforgeError::ConfigError(format!(
                "task '{}' sets `lint = true` but has no `cmd`",
                name
            )));
        }

        if let Some(src) = &task.src {
            if src.is_empty() {
                return Err(AssetforgeError::ConfigError(format!(
                    "task '{}' has an empty `src` glob list",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if !cfg.task.contains_key(dep) {
                return Err(AssetforgeError::ConfigError(format!(
                    "task '{}' has unknown prerequisite '{}' in `after`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(AssetforgeError::ConfigError(format!(
                    "task '{}' cannot depend on itself in `after`",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Build a petgraph graph from the tasks and their prerequisites.
    //
    // Edge direction: dep -> task. For:
    //   [task.B]
    //   after = ["A"]
    // we add edge A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    // A topological sort will fail if there is a cycle.
    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(AssetforgeError::DagCycle(format!(
                "cycle detected in task graph involving task '{}'",
                node
            )))
        }
    }
}

/// Two tasks writing the same output path is a configuration error
/// (the original last-write-wins behaviour is surfaced instead of kept).
///
/// Only outputs that are statically known can be checked here: a `concat`
/// step pins the output filename, and later `rename` steps adjust it.
/// Tasks that copy whole glob matches have lazily-resolved outputs, which
/// are not detectable at registration time.
fn validate_output_collisions(cfg: &RawConfigFile) -> Result<()> {
    let mut seen: HashMap<PathBuf, String> = HashMap::new();

    for (name, task) in cfg.task.iter() {
        for output in declared_outputs(task) {
            if let Some(first) = seen.get(&output) {
                return Err(AssetforgeError::DuplicateOutput {
                    path: output,
                    first: first.clone(),
                    second: name.clone(),
                });
            }
            seen.insert(output, name.clone());
        }
    }

    Ok(())
}

/// Statically-known output paths of a task, relative to the dest root.
fn declared_outputs(task: &TaskConfig) -> Vec<PathBuf> {
    let dest = task.dest.clone().unwrap_or_default();
    let mut current: Option<String> = None;

    for step in &task.steps {
        match step {
            StepSpec::Concat { output } => {
                current = Some(output.clone());
            }
            StepSpec::Rename { suffix, extension } => {
                if let Some(name) = current.take() {
                    current = Some(crate::pipeline::transform::renamed(
                        &name,
                        suffix.as_deref(),
                        extension.as_deref(),
                    ));
                }
            }
            StepSpec::HtmlReplace { .. } => {}
        }
    }

    current.into_iter().map(|n| dest.join(n)).collect()
}
