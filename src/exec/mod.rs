// src/exec/mod.rs

//! External tool invocation.
//!
//! Style compilers, minifiers, image optimizers, linters and accessibility
//! auditors are collaborators, not reimplemented here: a `cmd` task hands
//! the configured command line to the shell via `tokio::process::Command`,
//! forwards stdout/stderr to the log, and maps the exit status back into
//! the run report.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::{AssetforgeError, Result};
use crate::graph::registry::{RunnerOutcome, TaskRunner};

/// Runner that executes one external command per task invocation.
///
/// With `lint = true` a non-zero exit becomes [`RunnerOutcome::Findings`]:
/// the check is non-fatal by policy but the run's exit status reflects it.
pub struct ExecRunner {
    task_name: String,
    cmd: String,
    lint: bool,
}

impl ExecRunner {
    pub fn new(task_name: impl Into<String>, cmd: impl Into<String>, lint: bool) -> Self {
        Self {
            task_name: task_name.into(),
            cmd: cmd.into(),
            lint,
        }
    }

    async fn run_inner(&self) -> Result<RunnerOutcome> {
        info!(task = %self.task_name, cmd = %self.cmd, "starting external command");

        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning process for task '{}'", self.task_name))?;

        // Always consume both streams so buffers don't fill.
        if let Some(stdout) = child.stdout.take() {
            let task_name = self.task_name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    info!(task = %task_name, "stdout: {}", line);
                }
            });
        }

        if let Some(stderr) = child.stderr.take() {
            let task_name = self.task_name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(task = %task_name, "stderr: {}", line);
                }
            });
        }

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for process of task '{}'", self.task_name))?;

        let code = status.code().unwrap_or(-1);
        info!(
            task = %self.task_name,
            exit_code = code,
            success = status.success(),
            "external command exited"
        );

        if status.success() {
            Ok(RunnerOutcome::Clean)
        } else if self.lint {
            warn!(
                task = %self.task_name,
                exit_code = code,
                "check reported problems (non-fatal)"
            );
            Ok(RunnerOutcome::Findings)
        } else {
            Err(AssetforgeError::transform(
                &self.task_name,
                format!("command '{}' exited with status {}", self.cmd, code),
            ))
        }
    }
}

impl TaskRunner for ExecRunner {
    fn run(&self) -> Pin<Box<dyn Future<Output = Result<RunnerOutcome>> + Send + '_>> {
        Box::pin(self.run_inner())
    }
}
