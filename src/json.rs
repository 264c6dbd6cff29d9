//! JSON output for the reconciliation result.
//!
//! One object per run on stdout; the exit code follows `failed`.

use std::process::ExitCode;

use cql_user_reconciler::ReconciliationResult;
use serde::Serialize;

/// The serialized run report.
#[derive(Debug, Clone, Serialize)]
pub struct Report<'a> {
    #[serde(flatten)]
    pub result: &'a ReconciliationResult,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
}

impl<'a> Report<'a> {
    #[must_use]
    pub const fn new(result: &'a ReconciliationResult) -> Self {
        Self {
            result,
            failed: result.is_failure(),
        }
    }

    /// Render as a single-line JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// 0 for success (including no-op), 1 for any failure.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.failed {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}
