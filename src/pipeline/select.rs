// src/pipeline/select.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::fs::FileSystem;

/// Compiled include/exclude glob patterns.
///
/// Patterns are relative to a root directory; matching happens against
/// forward-slash relative path strings (e.g. `"css/scss/main.scss"`).
/// Resolution against the filesystem is lazy: files are discovered when
/// [`resolve`](GlobSelector::resolve) is called, not at configuration time.
#[derive(Clone)]
pub struct GlobSelector {
    includes: Vec<String>,
    include_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for GlobSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobSelector")
            .field("includes", &self.includes)
            .finish_non_exhaustive()
    }
}

impl GlobSelector {
    pub fn new(includes: &[String], excludes: &[String]) -> Result<Self> {
        let include_set = build_globset(includes).context("building include globset")?;
        let exclude_set = if excludes.is_empty() {
            None
        } else {
            Some(build_globset(excludes).context("building exclude globset")?)
        };

        Ok(Self {
            includes: includes.to_vec(),
            include_set,
            exclude_set,
        })
    }

    /// The raw include patterns this selector was built from.
    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    /// Returns true if the given root-relative path matches the selector.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }

    /// Walk `root` and collect all matching files, sorted by relative path
    /// for deterministic downstream behaviour (concat order, hashing).
    pub fn resolve(&self, fs: &dyn FileSystem, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut stack = vec![root.to_path_buf()];

        while let Some(dir) = stack.pop() {
            for path in fs.read_dir(&dir)? {
                if fs.is_dir(&path) {
                    stack.push(path);
                } else if fs.is_file(&path) {
                    if let Ok(rel) = path.strip_prefix(root) {
                        let rel_str = rel.to_string_lossy().replace('\\', "/");
                        if self.matches(&rel_str) {
                            files.push(rel.to_path_buf());
                        }
                    }
                }
            }
        }

        files.sort();
        Ok(files)
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
