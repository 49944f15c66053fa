//! Error types for ro-db

use thiserror::Error;

/// Storage engine errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Database could not be opened (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Ledger table existence check or creation failed (D002)
    #[error("[D002] Ledger table setup failed: {0}")]
    SchemaError(String),

    /// Ledger hash lookup failed (D003)
    #[error("[D003] Ledger lookup failed: {0}")]
    LookupError(String),

    /// Statement execution failed (D004)
    #[error("[D004] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Ledger insert failed (D005)
    #[error("[D005] Ledger record failed: {0}")]
    RecordError(String),

    /// Operation attempted without an open connection (D006)
    #[error("[D006] No open connection; prepare_connection must succeed first")]
    NotConnected,

    /// Mutex poisoned (D007)
    #[error("[D007] Database mutex poisoned: {0}")]
    MutexPoisoned(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Short name of the error category, used in logs and reports
    pub fn kind(&self) -> &'static str {
        match self {
            DbError::ConnectionError(_) => "connection",
            DbError::SchemaError(_) => "schema",
            DbError::LookupError(_) => "lookup",
            DbError::ExecutionError(_) => "execution",
            DbError::RecordError(_) => "record",
            DbError::NotConnected => "not_connected",
            DbError::MutexPoisoned(_) => "mutex_poisoned",
        }
    }
}
