//! Validation error raised before any constraint is assembled.
//!
//! A [`ValidationError`] carries every error-level issue found in one pass,
//! so the caller can fix all of its input at once.

use crate::diagnostics::{DiagnosticIssue, Diagnostics};
use thiserror::Error;

/// Input rejected: malformed topology, bad parameters or dangling references.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("validation failed with {} issue(s): {}", .issues.len(), join_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<DiagnosticIssue>,
}

fn join_issues(issues: &[DiagnosticIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Whether any issue is in the given category
    pub fn has_category(&self, category: &str) -> bool {
        self.issues.iter().any(|i| i.category == category)
    }

    /// Turn a finished validation pass into a result.
    ///
    /// Warnings are logged and kept in the returned diagnostics; errors fail
    /// the pass.
    pub fn check(diag: Diagnostics) -> Result<Diagnostics, ValidationError> {
        if diag.has_errors() {
            return Err(ValidationError {
                issues: diag.errors().cloned().collect(),
            });
        }
        diag.log_warnings();
        Ok(diag)
    }
}
