#![allow(dead_code)]

use std::collections::BTreeMap;

use assetforge::config::{
    ConfigFile, PathsSection, RawConfigFile, StepSpec, TaskConfig, WatchSection,
};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                paths: PathsSection::default(),
                watch: WatchSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_source(mut self, path: &str) -> Self {
        self.config.paths.source = path.into();
        self
    }

    pub fn with_dest(mut self, path: &str) -> Self {
        self.config.paths.dest = path.into();
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.config.watch.debounce_ms = ms;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    /// Build without unwrapping, for tests asserting validation errors.
    pub fn try_build(self) -> assetforge::errors::Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    /// A task that runs an external command.
    pub fn cmd(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: Some(cmd.to_string()),
                ..TaskConfig::default()
            },
        }
    }

    /// A built-in pipeline task over the given source globs.
    pub fn pipeline(src: &[&str]) -> Self {
        Self {
            task: TaskConfig {
                src: Some(src.iter().map(|s| s.to_string()).collect()),
                ..TaskConfig::default()
            },
        }
    }

    /// A body-less aggregator task with the given prerequisites.
    pub fn aggregate(after: &[&str]) -> Self {
        Self {
            task: TaskConfig {
                after: after.iter().map(|s| s.to_string()).collect(),
                ..TaskConfig::default()
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn lint(mut self, val: bool) -> Self {
        self.task.lint = val;
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        let excludes = self.task.exclude.get_or_insert(vec![]);
        excludes.push(pattern.to_string());
        self
    }

    pub fn step(mut self, step: StepSpec) -> Self {
        self.task.steps.push(step);
        self
    }

    pub fn dest(mut self, path: &str) -> Self {
        self.task.dest = Some(path.into());
        self
    }

    pub fn skip_unchanged(mut self, val: bool) -> Self {
        self.task.skip_unchanged = val;
        self
    }

    pub fn watch(mut self, pattern: &str) -> Self {
        let watches = self.task.watch.get_or_insert(vec![]);
        watches.push(pattern.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
