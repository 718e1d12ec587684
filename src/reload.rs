// src/reload.rs

//! Browser-reload notification channel.
//!
//! Reload is an explicit notification emitted after a task run's completion
//! signal resolves, never a side-channel call from inside transform steps.
//! The hub is a broadcast channel: the actual transport to a browser (live
//! reload server, websocket) subscribes on its own; tests subscribe directly.

use tokio::sync::broadcast;
use tracing::debug;

/// One reload notification: which tasks completed successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadEvent {
    pub tasks: Vec<String>,
}

/// Fan-out hub for reload notifications.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<ReloadEvent>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.tx.subscribe()
    }

    /// Notify subscribers that the given tasks completed successfully.
    ///
    /// Lagging or absent subscribers are fine; the send result is ignored.
    pub fn notify(&self, tasks: Vec<String>) {
        debug!(?tasks, "reload notification");
        let _ = self.tx.send(ReloadEvent { tasks });
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}
