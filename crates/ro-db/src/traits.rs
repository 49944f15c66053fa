//! Storage engine trait definition

use crate::error::DbResult;
use async_trait::async_trait;
use ro_core::StatementHash;

/// Capability set the migration runner needs from a database.
///
/// An engine owns its connection and the ledger table. Implementations must be
/// Send + Sync so they can be shared behind `Arc<dyn StorageEngine>`; they are
/// never driven concurrently.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Open the connection and make sure the ledger table exists.
    ///
    /// Creates the table with the fixed ledger schema when absent and leaves an
    /// existing table untouched. Fails with `ConnectionError` or `SchemaError`.
    async fn prepare_connection(&self, ledger: &str) -> DbResult<()>;

    /// Run one statement verbatim. Fails with `ExecutionError`.
    async fn execute_statement(&self, sql: &str) -> DbResult<()>;

    /// Whether the ledger already holds `hash`. Zero rows is `Ok(false)`.
    async fn is_applied(&self, hash: &StatementHash) -> DbResult<bool>;

    /// Append a ledger row for an executed statement. Fails with `RecordError`.
    async fn record_applied(&self, hash: &StatementHash, statement: &str) -> DbResult<()>;

    /// Release the connection. Best-effort: errors are swallowed.
    fn disconnect(&self);
}
