// src/pipeline/hash.rs

//! Content hashing for the skip-unchanged optimization.
//!
//! Steps with `skip_unchanged = true` (the image-copy style tasks) record a
//! blake3 hash per output path and skip the write when the new content
//! hashes identically. Because transforms are pure, re-running a step over
//! unchanged inputs produces byte-identical outputs, so the skip is safe.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::{debug, info};

/// Relative path (from the dest root) to the hashes file.
pub const HASH_FILE_PATH: &str = ".assetforge/hashes";

fn hash_file_path(root: &Path) -> PathBuf {
    root.join(HASH_FILE_PATH)
}

/// Hash a content buffer.
pub fn compute_content_hash(contents: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(contents);
    hasher.finalize().to_hex().to_string()
}

/// Abstract storage for per-output content hashes, keyed by the output path
/// relative to the dest root.
///
/// `save` may buffer; callers must `flush` once the step's writes are done.
pub trait HashStore: Send + Sync {
    fn load(&mut self, output: &str) -> Result<Option<String>>;
    fn save(&mut self, output: &str, hash: &str) -> Result<()>;

    /// Persist buffered saves. No-op for stores that don't buffer.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Stores hashes in `<dest>/.assetforge/hashes`, one `path hash` per line.
///
/// The file is read once on first access and rewritten once per `flush`,
/// so an n-file step does one read and one write, not n of each.
pub struct FileHashStore {
    root: PathBuf,
    cache: Option<HashMap<String, String>>,
    dirty: bool,
}

impl FileHashStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            cache: None,
            dirty: false,
        }
    }

    fn entries(&mut self) -> Result<&mut HashMap<String, String>> {
        if self.cache.is_none() {
            self.cache = Some(load_all_hashes(&self.root)?);
        }
        Ok(self.cache.get_or_insert_with(HashMap::new))
    }
}

impl HashStore for FileHashStore {
    fn load(&mut self, output: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(output).cloned())
    }

    fn save(&mut self, output: &str, hash: &str) -> Result<()> {
        self.entries()?.insert(output.to_string(), hash.to_string());
        self.dirty = true;
        debug!(output = %output, hash = %hash, "stored output hash (file)");
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(map) = &self.cache {
            save_all_hashes(&self.root, map)?;
        }
        self.dirty = false;
        Ok(())
    }
}

/// Stores hashes in memory only (lost on restart).
#[derive(Default)]
pub struct MemoryHashStore {
    map: HashMap<String, String>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HashStore for MemoryHashStore {
    fn load(&mut self, output: &str) -> Result<Option<String>> {
        Ok(self.map.get(output).cloned())
    }

    fn save(&mut self, output: &str, hash: &str) -> Result<()> {
        self.map.insert(output.to_string(), hash.to_string());
        debug!(output = %output, hash = %hash, "stored output hash (memory)");
        Ok(())
    }
}

fn load_all_hashes(root: &Path) -> Result<HashMap<String, String>> {
    let path = hash_file_path(root);

    if !path.exists() {
        return Ok(HashMap::new());
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("reading hash file at {:?}", path))?;

    let mut map = HashMap::new();
    for line in contents.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some((name, hash)) = trimmed.rsplit_once(char::is_whitespace) {
            map.insert(name.trim().to_string(), hash.to_string());
        }
    }

    Ok(map)
}

fn save_all_hashes(root: &Path, map: &HashMap<String, String>) -> Result<()> {
    let path = hash_file_path(root);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating hash directory at {:?}", parent))?;
    }

    let mut lines: Vec<String> = map.iter().map(|(k, v)| format!("{} {}", k, v)).collect();
    lines.sort();
    let mut body = lines.join("\n");
    body.push('\n');

    std::fs::write(&path, body).with_context(|| format!("writing hash file at {:?}", path))?;
    info!(entries = map.len(), "persisted output hashes");
    Ok(())
}
