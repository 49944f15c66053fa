//! Per-statement outcomes produced by a run.

use crate::hash::StatementHash;
use serde::Serialize;
use std::fmt;

/// Outcome of one statement within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementStatus {
    /// Executed and recorded in the ledger
    Applied,
    /// Lookup, execution, or recording failed
    Failed,
    /// Already present in the ledger; only reported when requested
    Skipped,
}

impl fmt::Display for StatementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementStatus::Applied => write!(f, "applied"),
            StatementStatus::Failed => write!(f, "failed"),
            StatementStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Result for a single statement, in input order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementResult {
    /// What happened to the statement
    pub status: StatementStatus,

    /// Statement text exactly as supplied
    pub statement: String,

    /// Ledger key of the statement
    pub hash: StatementHash,

    /// Error message, present only for failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatementResult {
    /// A statement that was executed and recorded
    pub fn applied(statement: impl Into<String>, hash: StatementHash) -> Self {
        Self {
            status: StatementStatus::Applied,
            statement: statement.into(),
            hash,
            message: None,
        }
    }

    /// A statement that failed at any step
    pub fn failed(
        statement: impl Into<String>,
        hash: StatementHash,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status: StatementStatus::Failed,
            statement: statement.into(),
            hash,
            message: Some(message.into()),
        }
    }

    /// A statement found in the ledger and not executed
    pub fn skipped(statement: impl Into<String>, hash: StatementHash) -> Self {
        Self {
            status: StatementStatus::Skipped,
            statement: statement.into(),
            hash,
            message: None,
        }
    }

    /// True only for statements applied during this run.
    pub fn is_success(&self) -> bool {
        self.status == StatementStatus::Applied
    }
}
