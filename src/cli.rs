// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `assetforge`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetforge",
    version,
    about = "Run asset build tasks from a dependency graph, with watch/reload.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run. Common entry points are `default`, `build`, `lint`;
    /// any task from the config can be named.
    #[arg(value_name = "TASK", default_value = "default")]
    pub task: String,

    /// Path to the config file (TOML).
    ///
    /// Default: `Assetforge.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Assetforge.toml")]
    pub config: String,

    /// Development mode: after the initial run, keep watching bound globs
    /// and re-run tasks on changes.
    #[arg(long)]
    pub watch: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETFORGE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the task graph, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
