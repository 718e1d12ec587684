// src/watch/mod.rs

//! File watching and the watch/reload loop.
//!
//! This module turns filesystem change events into debounced task re-runs:
//!
//! - [`binding`] maps compiled glob selectors to task names.
//! - [`debounce`] is the pure per-binding state machine
//!   (`Idle -> Debouncing -> Running -> Idle`).
//! - [`watcher`] is the async shell: a `notify` watcher on the source root,
//!   a fan-out loop, and one debounce loop per binding.
//!
//! It does not know how tasks execute; it only asks the orchestrator.

pub mod binding;
pub mod debounce;
pub mod watcher;

pub use binding::{build_watch_bindings, WatchBinding};
pub use debounce::{DebounceAction, DebounceState, Debouncer};
pub use watcher::{relative_str, spawn_binding_loop, spawn_watcher, WatcherHandle};
