// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - [`model`] mirrors the `Assetforge.toml` layout.
//! - [`loader`] reads and deserializes config files.
//! - [`validate`] turns a `RawConfigFile` into a validated `ConfigFile`
//!   (graph acyclicity, task body shape, output collisions).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, PathsSection, RawConfigFile, StepSpec, TaskConfig, WatchSection};
