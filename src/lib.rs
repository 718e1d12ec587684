// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod graph;
pub mod lint;
pub mod logging;
pub mod pipeline;
pub mod reload;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::fs::RealFileSystem;
use crate::graph::{Orchestrator, TaskGraph, TaskRegistry};
use crate::pipeline::hash::{FileHashStore, HashStore};
use crate::reload::ReloadHub;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - task registry / graph / orchestrator
/// - the requested run
/// - (optional) file watcher + reload hub
/// - Ctrl-C handling
///
/// Returns the process exit code: non-zero when any transform error or lint
/// finding occurred during the invocation.
pub async fn run(args: CliArgs) -> Result<i32> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(0);
    }

    let root_dir = config_root_dir(&config_path);
    let source_root = root_dir.join(&cfg.paths.source);
    let dest_root = root_dir.join(&cfg.paths.dest);

    // Re-anchor paths so tasks run correctly from any working directory.
    let mut anchored = cfg.clone();
    anchored.paths.source = source_root.clone();
    anchored.paths.dest = dest_root.clone();

    let fs: Arc<dyn crate::fs::FileSystem> = Arc::new(RealFileSystem);
    let hash_store: Arc<Mutex<Box<dyn HashStore>>> =
        Arc::new(Mutex::new(Box::new(FileHashStore::new(dest_root.clone()))));

    let registry = Arc::new(TaskRegistry::from_config(
        &anchored,
        Arc::clone(&fs),
        Arc::clone(&hash_store),
    )?);
    let graph = TaskGraph::from_config(&anchored);
    let orchestrator = Arc::new(Orchestrator::new(registry, graph));

    // Initial run of the requested task.
    let report = orchestrator.run(&args.task).await?;
    let exit_code = report.exit_code();

    for failed in report.failed_tasks() {
        info!(task = %failed, outcome = ?report.outcome_of(failed), "task did not succeed");
    }

    if args.watch {
        let bindings = watch::build_watch_bindings(&anchored)?;
        let reload = ReloadHub::new();
        let window = Duration::from_millis(cfg.watch.debounce_ms);

        let _watcher_handle = watch::spawn_watcher(
            source_root,
            bindings,
            Arc::clone(&orchestrator),
            reload,
            window,
        )?;

        info!("watching for changes; press Ctrl-C to stop");
        tokio::signal::ctrl_c().await?;
        info!("shutdown requested");
    }

    // Watch mode is interactive; the initial run's findings still count.

    Ok(exit_code)
}

/// Figure out a sensible project root.
///
/// - If the config path has a non-empty parent (e.g. "site/Assetforge.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Assetforge.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Simple dry-run output: print tasks, prerequisites and bodies.
fn print_dry_run(cfg: &ConfigFile) {
    println!("assetforge dry-run");
    println!("  paths.source = {:?}", cfg.paths.source);
    println!("  paths.dest = {:?}", cfg.paths.dest);
    println!("  watch.debounce_ms = {}", cfg.watch.debounce_ms);
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        println!("  - {name}");
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        if let Some(cmd) = &task.cmd {
            println!("      cmd: {cmd}");
            if task.lint {
                println!("      lint: true");
            }
        }
        if let Some(src) = &task.src {
            println!("      src: {:?}", src);
            println!("      steps: {}", task.steps.len());
            if let Some(dest) = &task.dest {
                println!("      dest: {:?}", dest);
            }
            if task.skip_unchanged {
                println!("      skip_unchanged: true");
            }
        }
        if let Some(watch) = &task.watch {
            println!("      watch: {:?}", watch);
        }
    }
}
