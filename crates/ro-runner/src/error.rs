//! Error types for ro-runner

use ro_core::StatementHash;
use ro_db::DbError;
use thiserror::Error;

/// Runner errors, each wrapping the storage engine error verbatim
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The ledger could not be prepared; the runner was not created (R001)
    #[error("[R001] Failed to prepare ledger '{ledger}': {source}")]
    Prepare {
        ledger: String,
        #[source]
        source: DbError,
    },

    /// A statement failed during lookup, execution, or recording (R002)
    #[error("[R002] Statement {hash} failed: {source}")]
    Statement {
        hash: StatementHash,
        statement: String,
        #[source]
        source: DbError,
    },
}

/// Result type alias for RunnerError
pub type RunnerResult<T> = Result<T, RunnerError>;

impl RunnerError {
    /// The underlying storage engine error
    pub fn db_error(&self) -> &DbError {
        match self {
            RunnerError::Prepare { source, .. } | RunnerError::Statement { source, .. } => source,
        }
    }

    /// The statement that failed, if the error came from a run
    pub fn statement(&self) -> Option<&str> {
        match self {
            RunnerError::Statement { statement, .. } => Some(statement),
            RunnerError::Prepare { .. } => None,
        }
    }
}
