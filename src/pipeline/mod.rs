// src/pipeline/mod.rs

//! Per-file transform pipelines.
//!
//! - [`asset`] is the in-memory file representation (buffer + virtual path).
//! - [`select`] compiles and lazily resolves glob selectors.
//! - [`transform`] holds the built-in operations and the `Transform` seam.
//! - [`step`] runs an ordered transform list over a selection and writes
//!   the results under the dest root.
//! - [`hash`] backs the skip-unchanged optimization.

pub mod asset;
pub mod hash;
pub mod select;
pub mod step;
pub mod transform;

pub use asset::Asset;
pub use hash::{FileHashStore, HashStore, MemoryHashStore, HASH_FILE_PATH};
pub use select::GlobSelector;
pub use step::{PipelineStep, StepSummary};
pub use transform::Transform;
