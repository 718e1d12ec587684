// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration as read from `Assetforge.toml`, pre-validation.
///
/// ```toml
/// [paths]
/// source = "src"
/// dest = "build"
///
/// [watch]
/// debounce_ms = 100
///
/// [task.styles]
/// cmd = "sass src/scss:src/css"
/// watch = ["scss/**/*.scss"]
///
/// [task.scripts]
/// src = ["js/vendor/*.js"]
/// dest = "js"
/// steps = [{ kind = "concat", output = "main.js" }]
/// ```
///
/// All sections except `[task.*]` are optional and have defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Source/destination roots from `[paths]`.
    #[serde(default)]
    pub paths: PathsSection,

    /// Watch-loop behaviour from `[watch]`.
    #[serde(default)]
    pub watch: WatchSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated configuration.
///
/// Constructed only through `TryFrom<RawConfigFile>` (see `config::validate`),
/// so holding a `ConfigFile` implies the task graph is acyclic, all `after`
/// references resolve, every task has a well-formed body (or is an
/// aggregator with prerequisites), and no two tasks declare the same output
/// path.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub paths: PathsSection,
    pub watch: WatchSection,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    /// Internal constructor used by validation; not part of the public API
    /// contract. Callers must have validated `task` beforehand.
    pub(crate) fn new_unchecked(
        paths: PathsSection,
        watch: WatchSection,
        task: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self { paths, watch, task }
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }
}

/// `[paths]` section: the fixed source/destination split.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    /// Root directory that glob selectors are resolved against.
    #[serde(default = "default_source_root")]
    pub source: PathBuf,

    /// Root directory that pipeline steps write under.
    #[serde(default = "default_dest_root")]
    pub dest: PathBuf,
}

fn default_source_root() -> PathBuf {
    PathBuf::from("src")
}

fn default_dest_root() -> PathBuf {
    PathBuf::from("build")
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            source: default_source_root(),
            dest: default_dest_root(),
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Debounce window in milliseconds used to coalesce rapid change events
    /// for the same binding into a single re-run.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// `[task.<name>]` section.
///
/// A task body is either an external command (`cmd`) or a built-in transform
/// pipeline (`src` + `steps` + `dest`). A task with neither body acts as an
/// aggregator and must declare at least one `after` prerequisite. Declaring
/// both bodies is rejected by validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskConfig {
    /// Dependency list: this task waits for all tasks listed here.
    #[serde(default)]
    pub after: Vec<String>,

    /// External command to run through the shell (e.g. a Sass compiler,
    /// minifier or linter invocation).
    #[serde(default)]
    pub cmd: Option<String>,

    /// Marks a lint-style check: a non-zero exit is recorded as findings in
    /// the run report instead of failing the task and blocking dependents.
    #[serde(default)]
    pub lint: bool,

    /// Include globs for the built-in pipeline, relative to `paths.source`.
    #[serde(default)]
    pub src: Option<Vec<String>>,

    /// Exclude globs for the built-in pipeline.
    #[serde(default)]
    pub exclude: Option<Vec<String>>,

    /// Ordered built-in operations applied to the matched files.
    #[serde(default)]
    pub steps: Vec<StepSpec>,

    /// Output directory relative to `paths.dest`. Defaults to `""`, i.e.
    /// matched files keep their source-relative paths under the dest root.
    #[serde(default)]
    pub dest: Option<PathBuf>,

    /// Skip writing outputs whose content is unchanged since the last run
    /// (content-hash based; used for the image-copy style tasks).
    #[serde(default)]
    pub skip_unchanged: bool,

    /// Watch globs that should re-trigger this task during `--watch`,
    /// relative to `paths.source`. Pipeline tasks default to their `src`
    /// globs; `cmd` tasks are only watched if this is set.
    #[serde(default)]
    pub watch: Option<Vec<String>>,

    /// Exclude globs applied to `watch`.
    #[serde(default)]
    pub watch_exclude: Option<Vec<String>>,
}

impl TaskConfig {
    /// Effective watch include globs, if any.
    pub fn effective_watch(&self) -> Option<&[String]> {
        self.watch
            .as_deref()
            .or(self.src.as_deref())
            .filter(|g| !g.is_empty())
    }

    /// Effective watch exclude globs.
    pub fn effective_watch_exclude(&self) -> &[String] {
        self.watch_exclude
            .as_deref()
            .or(self.exclude.as_deref())
            .unwrap_or(&[])
    }

    /// Whether this task has a pipeline body (as opposed to `cmd`).
    pub fn is_pipeline(&self) -> bool {
        self.src.is_some()
    }
}

/// One built-in operation inside a pipeline task's `steps = [...]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepSpec {
    /// Concatenate all matched files, in selector order, into one output.
    Concat { output: String },

    /// Insert a suffix before the file extension (`main.js` -> `main.min.js`)
    /// and/or replace the extension entirely.
    Rename {
        #[serde(default)]
        suffix: Option<String>,
        #[serde(default)]
        extension: Option<String>,
    },

    /// Rewrite `<!-- build:<name> --> ... <!-- endbuild -->` blocks in HTML
    /// with a single reference to the named replacement.
    HtmlReplace {
        replacements: BTreeMap<String, String>,
    },
}
