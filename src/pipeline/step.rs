// src/pipeline/step.rs

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::errors::{AssetforgeError, Result};
use crate::fs::FileSystem;
use crate::pipeline::asset::Asset;
use crate::pipeline::hash::{compute_content_hash, HashStore};
use crate::pipeline::select::GlobSelector;
use crate::pipeline::transform::Transform;

/// Outcome summary of one pipeline step execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepSummary {
    /// Output paths written, relative to the dest root.
    pub written: Vec<PathBuf>,
    /// Outputs skipped because their content hash was unchanged.
    pub skipped: Vec<PathBuf>,
}

fn lock_store<'a>(
    store: &'a Arc<Mutex<Box<dyn HashStore>>>,
) -> Result<std::sync::MutexGuard<'a, Box<dyn HashStore>>> {
    store
        .lock()
        .map_err(|_| AssetforgeError::ConfigError("hash store poisoned".into()))
}

/// An ordered transform pipeline over a glob selection.
///
/// Running a step:
/// 1. resolves the selector against the source root (lazy, at run time),
/// 2. reads the matched files into in-memory [`Asset`]s,
/// 3. applies the transforms in declared order,
/// 4. writes the surviving assets under `dest_prefix` below the dest root,
///    preserving relative paths unless a transform renamed them.
///
/// With `skip_unchanged`, outputs whose content hash matches the stored hash
/// are not rewritten.
pub struct PipelineStep {
    task_name: String,
    selector: GlobSelector,
    transforms: Vec<Box<dyn Transform>>,
    dest_prefix: PathBuf,
    skip_unchanged: bool,
}

impl std::fmt::Debug for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineStep")
            .field("task_name", &self.task_name)
            .field("selector", &self.selector)
            .field("dest_prefix", &self.dest_prefix)
            .field("skip_unchanged", &self.skip_unchanged)
            .finish_non_exhaustive()
    }
}

impl PipelineStep {
    pub fn new(
        task_name: impl Into<String>,
        selector: GlobSelector,
        transforms: Vec<Box<dyn Transform>>,
        dest_prefix: PathBuf,
        skip_unchanged: bool,
    ) -> Self {
        Self {
            task_name: task_name.into(),
            selector,
            transforms,
            dest_prefix,
            skip_unchanged,
        }
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    /// Execute the step once.
    pub fn run(
        &self,
        fs: &dyn FileSystem,
        source_root: &std::path::Path,
        dest_root: &std::path::Path,
        hash_store: &Arc<Mutex<Box<dyn HashStore>>>,
    ) -> Result<StepSummary> {
        let matched = self
            .selector
            .resolve(fs, source_root)
            .map_err(AssetforgeError::Other)?;

        debug!(
            task = %self.task_name,
            files = matched.len(),
            "selector resolved"
        );

        let mut batch = Vec::with_capacity(matched.len());
        for rel in matched {
            let contents = fs
                .read(&source_root.join(&rel))
                .map_err(AssetforgeError::Other)?;
            batch.push(Asset::new(rel, contents));
        }

        for transform in &self.transforms {
            debug!(
                task = %self.task_name,
                transform = transform.name(),
                batch = batch.len(),
                "applying transform"
            );
            batch = transform.apply(batch)?;
        }

        let mut summary = StepSummary::default();

        for asset in batch {
            let out_rel = self.dest_prefix.join(&asset.rel_path);
            let out_key = out_rel.to_string_lossy().replace('\\', "/");

            let new_hash = self
                .skip_unchanged
                .then(|| compute_content_hash(&asset.contents));

            if let Some(hash) = &new_hash {
                let mut store = lock_store(hash_store)?;
                match store.load(&out_key).map_err(AssetforgeError::Other)? {
                    Some(old) if old == *hash && fs.is_file(&dest_root.join(&out_rel)) => {
                        debug!(task = %self.task_name, output = %out_key, "content unchanged; skipping write");
                        summary.skipped.push(out_rel);
                        continue;
                    }
                    _ => {}
                }
            }

            fs.write(&dest_root.join(&out_rel), &asset.contents)
                .map_err(AssetforgeError::Other)?;

            // Record the hash only once the bytes are on disk; a failed
            // write must be retried on the next run, not skipped.
            if let Some(hash) = &new_hash {
                lock_store(hash_store)?
                    .save(&out_key, hash)
                    .map_err(AssetforgeError::Other)?;
            }

            summary.written.push(out_rel);
        }

        if self.skip_unchanged {
            lock_store(hash_store)?
                .flush()
                .map_err(AssetforgeError::Other)?;
        }

        info!(
            task = %self.task_name,
            written = summary.written.len(),
            skipped = summary.skipped.len(),
            "pipeline step finished"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::fs::MemoryFileSystem;
    use crate::pipeline::hash::MemoryHashStore;
    use crate::pipeline::transform::{Concat, Rename};

    fn hash_store() -> Arc<Mutex<Box<dyn HashStore>>> {
        Arc::new(Mutex::new(Box::new(MemoryHashStore::new())))
    }

    fn selector(globs: &[&str]) -> GlobSelector {
        let inc: Vec<String> = globs.iter().map(|s| s.to_string()).collect();
        GlobSelector::new(&inc, &[]).unwrap()
    }

    #[test]
    fn concat_then_rename_writes_single_output() {
        let fs = MemoryFileSystem::new();
        fs.add_file("src/js/vendor/a.js", "a();\n");
        fs.add_file("src/js/vendor/b.js", "b();\n");

        let step = PipelineStep::new(
            "scripts",
            selector(&["js/vendor/*.js"]),
            vec![
                Box::new(Concat::new("main.js")),
                Box::new(Rename {
                    suffix: Some(".min".into()),
                    extension: None,
                }),
            ],
            PathBuf::from("js"),
            false,
        );

        let summary = step
            .run(&fs, Path::new("src"), Path::new("build"), &hash_store())
            .unwrap();

        assert_eq!(summary.written, vec![PathBuf::from("js/main.min.js")]);
        assert_eq!(
            fs.read(Path::new("build/js/main.min.js")).unwrap(),
            b"a();\nb();\n"
        );
    }

    #[test]
    fn copy_step_preserves_relative_paths() {
        let fs = MemoryFileSystem::new();
        fs.add_file("src/img/icons/x.png", "xx");
        fs.add_file("src/img/y.png", "yy");

        let step = PipelineStep::new(
            "images",
            selector(&["img/**/*.png"]),
            Vec::new(),
            PathBuf::new(),
            false,
        );

        step.run(&fs, Path::new("src"), Path::new("build"), &hash_store())
            .unwrap();

        assert!(fs.is_file(Path::new("build/img/icons/x.png")));
        assert!(fs.is_file(Path::new("build/img/y.png")));
    }

    #[test]
    fn skip_unchanged_is_idempotent_and_skips_second_write() {
        let fs = MemoryFileSystem::new();
        fs.add_file("src/img/a.png", "payload");

        let step = PipelineStep::new(
            "images",
            selector(&["img/*.png"]),
            Vec::new(),
            PathBuf::new(),
            true,
        );

        let store = hash_store();
        let first = step
            .run(&fs, Path::new("src"), Path::new("build"), &store)
            .unwrap();
        assert_eq!(first.written, vec![PathBuf::from("img/a.png")]);

        let before = fs.read(Path::new("build/img/a.png")).unwrap();

        let second = step
            .run(&fs, Path::new("src"), Path::new("build"), &store)
            .unwrap();
        assert!(second.written.is_empty());
        assert_eq!(second.skipped, vec![PathBuf::from("img/a.png")]);

        // Byte-identical destination either way.
        assert_eq!(fs.read(Path::new("build/img/a.png")).unwrap(), before);
    }

    /// Filesystem whose first N writes fail, for error-path tests.
    #[derive(Debug)]
    struct FlakyFileSystem {
        inner: MemoryFileSystem,
        failures_left: Mutex<usize>,
    }

    impl FlakyFileSystem {
        fn failing_writes(inner: MemoryFileSystem, failures: usize) -> Self {
            Self {
                inner,
                failures_left: Mutex::new(failures),
            }
        }
    }

    impl FileSystem for FlakyFileSystem {
        fn read(&self, path: &Path) -> anyhow::Result<Vec<u8>> {
            self.inner.read(path)
        }

        fn read_to_string(&self, path: &Path) -> anyhow::Result<String> {
            self.inner.read_to_string(path)
        }

        fn write(&self, path: &Path, contents: &[u8]) -> anyhow::Result<()> {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                anyhow::bail!("write failed: {:?}", path);
            }
            self.inner.write(path, contents)
        }

        fn exists(&self, path: &Path) -> bool {
            self.inner.exists(path)
        }

        fn is_file(&self, path: &Path) -> bool {
            self.inner.is_file(path)
        }

        fn is_dir(&self, path: &Path) -> bool {
            self.inner.is_dir(path)
        }

        fn read_dir(&self, path: &Path) -> anyhow::Result<Vec<PathBuf>> {
            self.inner.read_dir(path)
        }
    }

    #[test]
    fn failed_write_is_retried_on_the_next_run_not_skipped() {
        let fs = FlakyFileSystem::failing_writes(MemoryFileSystem::new(), 1);
        fs.inner.add_file("src/img/a.png", "new-bytes");
        // Stale output from an earlier run is still on disk.
        fs.inner.add_file("build/img/a.png", "old-bytes");

        let step = PipelineStep::new(
            "images",
            selector(&["img/*.png"]),
            Vec::new(),
            PathBuf::new(),
            true,
        );
        let store = hash_store();

        let first = step.run(&fs, Path::new("src"), Path::new("build"), &store);
        assert!(first.is_err());

        // The failed write must not have recorded the new hash.
        let second = step
            .run(&fs, Path::new("src"), Path::new("build"), &store)
            .unwrap();
        assert_eq!(second.written, vec![PathBuf::from("img/a.png")]);
        assert!(second.skipped.is_empty());
        assert_eq!(
            fs.inner.read(Path::new("build/img/a.png")).unwrap(),
            b"new-bytes"
        );
    }

    #[test]
    fn missing_source_dir_is_an_error() {
        let fs = MemoryFileSystem::new();
        let step = PipelineStep::new(
            "images",
            selector(&["img/*.png"]),
            Vec::new(),
            PathBuf::new(),
            false,
        );

        let res = step.run(&fs, Path::new("nope"), Path::new("build"), &hash_store());
        assert!(res.is_err());
    }
}
