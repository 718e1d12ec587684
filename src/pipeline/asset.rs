// src/pipeline/asset.rs

use std::path::{Path, PathBuf};

/// One file flowing through a pipeline step: an in-memory buffer plus its
/// virtual path, relative to the source root.
///
/// Transforms may replace the contents and/or the path; the on-disk location
/// is only decided when the step writes the surviving assets under the
/// destination root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub rel_path: PathBuf,
    pub contents: Vec<u8>,
}

impl Asset {
    pub fn new(rel_path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            rel_path: rel_path.into(),
            contents: contents.into(),
        }
    }

    /// File name component of the virtual path, lossily converted.
    pub fn file_name(&self) -> String {
        self.rel_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Replace the file name, keeping any parent directories.
    pub fn with_file_name(mut self, name: &str) -> Self {
        self.rel_path = match self.rel_path.parent() {
            Some(parent) if parent != Path::new("") => parent.join(name),
            _ => PathBuf::from(name),
        };
        self
    }

    /// Contents as UTF-8, or a per-file transform error.
    pub fn text(&self) -> Result<&str, String> {
        std::str::from_utf8(&self.contents).map_err(|_| "contents are not valid UTF-8".to_string())
    }
}
