// src/lint.rs

//! Structured lint reporting.
//!
//! External linters run as `cmd` tasks and only surface an exit status;
//! in-process checkers implement [`Lint`] over matched assets and produce
//! [`LintIssue`]s, which are reported with the offending file path and a
//! human-readable message.

use std::fmt;

use tracing::warn;

use crate::pipeline::asset::Asset;

/// One problem found by a checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintIssue {
    pub path: String,
    pub line: usize,
    pub column: usize,
    pub code: String,
    pub message: String,
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{},{}]: ({}) {}",
            self.path, self.line, self.column, self.code, self.message
        )
    }
}

/// An in-process checker over a batch of assets.
pub trait Lint: Send + Sync {
    fn name(&self) -> &'static str;
    fn check(&self, batch: &[Asset]) -> Vec<LintIssue>;
}

/// Log every issue at warn level; returns the number of issues.
pub fn report_issues(checker: &str, issues: &[LintIssue]) -> usize {
    for issue in issues {
        warn!(checker = %checker, "{}", issue);
    }
    issues.len()
}
