// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::graph::Orchestrator;
use crate::reload::ReloadHub;
use crate::watch::binding::WatchBinding;
use crate::watch::debounce::{DebounceAction, Debouncer};

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive
/// for as long as needed. Dropping this handle stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher observing `root` recursively, fanning change
/// events out to one debounce loop per binding.
///
/// - `root` is the source root that all binding globs are evaluated against.
/// - On a binding's window expiry, the orchestrator runs the bound tasks;
///   successful runs notify the reload hub.
///
/// The loops never terminate on their own; they end with the process.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    bindings: Vec<WatchBinding>,
    orchestrator: Arc<Orchestrator>,
    reload: ReloadHub,
    window: Duration,
) -> Result<WatcherHandle> {
    let root = root.into();
    // Canonicalize once so we have a stable base path.
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());

    // One debounce loop (and ping channel) per binding.
    let loops: Vec<(WatchBinding, mpsc::UnboundedSender<()>)> = bindings
        .into_iter()
        .map(|binding| {
            let tx = spawn_binding_loop(
                binding.clone(),
                Arc::clone(&orchestrator),
                reload.clone(),
                window,
            );
            (binding, tx)
        })
        .collect();

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // We can't log via tracing here easily, so fall back to stderr.
                    eprintln!("assetforge: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("assetforge: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!("file watcher started on {:?}", root);

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received notify event");
            for path in &event.paths {
                let Some(rel) = relative_str(&root, path) else {
                    continue;
                };
                for (binding, tx) in &loops {
                    if binding.matches(&rel) {
                        debug!(rel = %rel, ?binding, "change event matches binding");
                        let _ = tx.send(());
                    }
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Spawn the debounce/run loop for one binding and return its ping sender.
///
/// Exposed separately so tests can drive a loop with synthetic change
/// events instead of a real `notify` watcher.
pub fn spawn_binding_loop(
    binding: WatchBinding,
    orchestrator: Arc<Orchestrator>,
    reload: ReloadHub,
    window: Duration,
) -> mpsc::UnboundedSender<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<()>();

    tokio::spawn(async move {
        let mut deb = Debouncer::new();

        // Idle: block until the first change event for this binding.
        while rx.recv().await.is_some() {
            let action = deb.on_event();
            debug_assert_eq!(action, DebounceAction::StartTimer);

            // Debouncing: the window is fixed from the first event; later
            // events coalesce into the same run.
            let deadline = tokio::time::Instant::now() + window;
            loop {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => {
                        if deb.on_timer() == DebounceAction::TriggerRun {
                            break;
                        }
                    }
                    ping = rx.recv() => {
                        match ping {
                            Some(()) => { deb.on_event(); }
                            None => return,
                        }
                    }
                }
            }

            // Running: execute, then honour at most one queued follow-up
            // per completed run.
            loop {
                run_bound_tasks(&binding, &orchestrator, &reload).await;

                while rx.try_recv().is_ok() {
                    deb.on_event();
                }

                if deb.on_run_finished() != DebounceAction::TriggerRun {
                    break;
                }
                debug!(?binding, "follow-up run for events received while running");
            }
        }

        debug!(?binding, "binding loop finished (channel closed)");
    });

    tx
}

async fn run_bound_tasks(
    binding: &WatchBinding,
    orchestrator: &Orchestrator,
    reload: &ReloadHub,
) {
    let mut reload_tasks = Vec::new();

    for task in binding.tasks() {
        match orchestrator.run(task).await {
            Ok(report) if !report.has_failures() => {
                reload_tasks.push(task.clone());
            }
            Ok(report) => {
                warn!(
                    task = %task,
                    failed = ?report.failed_tasks().collect::<Vec<_>>(),
                    "watch-triggered run failed; skipping reload"
                );
            }
            Err(err) => {
                warn!(task = %task, error = %err, "watch-triggered run error");
            }
        }
    }

    if !reload_tasks.is_empty() {
        reload.notify(reload_tasks);
    }
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Falls back to canonicalizing both sides, which helps on platforms where
/// the watcher reports a different absolute prefix for the same directory
/// (e.g. symlinked temp dirs on macOS).
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(rel.to_string_lossy().replace('\\', "/"));
        }
    }

    None
}
