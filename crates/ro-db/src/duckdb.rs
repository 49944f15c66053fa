//! DuckDB storage engine implementation

use crate::error::{DbError, DbResult};
use crate::ledger::{id_sequence_name, insert_sql, lookup_sql, split_qualified, unquote};
use crate::traits::StorageEngine;
use async_trait::async_trait;
use duckdb::Connection;
use ro_core::{StatementHash, LEDGER_STATEMENT_MAX_LEN};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const MEMORY_DESCRIPTOR: &str = ":memory:";

/// Open connection plus the ledger it was prepared for
struct Session {
    conn: Connection,
    ledger: String,
}

/// DuckDB storage engine
///
/// The descriptor is a database file path or `:memory:`. Note that an
/// in-memory ledger does not survive `disconnect`.
pub struct DuckDbEngine {
    descriptor: String,
    session: Mutex<Option<Session>>,
}

impl DuckDbEngine {
    /// Create an engine for `descriptor`; nothing is opened until
    /// `prepare_connection`.
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            session: Mutex::new(None),
        }
    }

    /// The connection descriptor this engine was created with
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    fn open(&self) -> DbResult<Connection> {
        let opened = if self.descriptor == MEMORY_DESCRIPTOR {
            Connection::open_in_memory()
        } else {
            Connection::open(Path::new(&self.descriptor))
        };
        opened.map_err(|e| DbError::ConnectionError(format!("{}: {}", e, self.descriptor)))
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Option<Session>>> {
        self.session
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Run `f` against the open session
    fn with_session<T>(&self, f: impl FnOnce(&Session) -> DbResult<T>) -> DbResult<T> {
        let guard = self.lock()?;
        let session = guard.as_ref().ok_or(DbError::NotConnected)?;
        f(session)
    }

    /// Check if the ledger table exists synchronously
    ///
    /// DuckDB resolves identifiers case-insensitively, so the lookup does too.
    fn ledger_exists_sync(conn: &Connection, ledger: &str) -> DbResult<bool> {
        let (schema, table) = split_qualified(ledger, "main");

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables \
                 WHERE lower(table_schema) = lower(?) AND lower(table_name) = lower(?)",
                duckdb::params![unquote(schema), unquote(table)],
                |row| row.get(0),
            )
            .map_err(|e| DbError::SchemaError(e.to_string()))?;

        Ok(count > 0)
    }

    /// Create the ledger table (and its id sequence) synchronously
    fn create_ledger_sync(conn: &Connection, ledger: &str) -> DbResult<()> {
        let mut ddl = String::new();
        if let Some(pos) = ledger.rfind('.') {
            ddl.push_str(&format!("CREATE SCHEMA IF NOT EXISTS {};\n", &ledger[..pos]));
        }
        ddl.push_str(&format!(
            "CREATE SEQUENCE IF NOT EXISTS {seq} START 1;
             CREATE TABLE IF NOT EXISTS {ledger} (
                 id         BIGINT PRIMARY KEY DEFAULT nextval('{seq}'),
                 hash       VARCHAR({hash_len}) NOT NULL UNIQUE CHECK (length(hash) = {hash_len}),
                 statement  VARCHAR({max_len}) NOT NULL CHECK (length(statement) <= {max_len}),
                 created_at TIMESTAMP NOT NULL DEFAULT now()
             );",
            ledger = ledger,
            seq = id_sequence_name(ledger),
            hash_len = StatementHash::HEX_LEN,
            max_len = LEDGER_STATEMENT_MAX_LEN,
        ));

        Self::transaction(conn, &ddl)
            .map_err(|e| DbError::SchemaError(format!("failed to create ledger {}: {}", ledger, e)))
    }

    /// Run `sql` inside one transaction, rolling back if any part fails.
    fn transaction(conn: &Connection, sql: &str) -> duckdb::Result<()> {
        conn.execute_batch("BEGIN TRANSACTION")?;

        if let Err(e) = conn.execute_batch(sql) {
            let _ = conn.execute_batch("ROLLBACK");
            return Err(e);
        }
        if let Err(e) = conn.execute_batch("COMMIT") {
            let _ = conn.execute_batch("ROLLBACK");
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl StorageEngine for DuckDbEngine {
    async fn prepare_connection(&self, ledger: &str) -> DbResult<()> {
        let conn = self.open()?;

        if Self::ledger_exists_sync(&conn, ledger)? {
            log::debug!("Ledger table {} already exists", ledger);
        } else {
            Self::create_ledger_sync(&conn, ledger)?;
            log::info!("Created ledger table {}", ledger);
        }

        *self.lock()? = Some(Session {
            conn,
            ledger: ledger.to_string(),
        });
        Ok(())
    }

    async fn execute_statement(&self, sql: &str) -> DbResult<()> {
        self.with_session(|s| {
            s.conn
                .execute_batch(sql)
                .map_err(|e| DbError::ExecutionError(e.to_string()))
        })
    }

    async fn is_applied(&self, hash: &StatementHash) -> DbResult<bool> {
        self.with_session(|s| {
            let count: i64 = s
                .conn
                .query_row(&lookup_sql(&s.ledger), duckdb::params![hash.as_str()], |row| {
                    row.get(0)
                })
                .map_err(|e| DbError::LookupError(e.to_string()))?;
            Ok(count > 0)
        })
    }

    async fn record_applied(&self, hash: &StatementHash, statement: &str) -> DbResult<()> {
        self.with_session(|s| {
            s.conn
                .execute(
                    &insert_sql(&s.ledger),
                    duckdb::params![hash.as_str(), statement],
                )
                .map_err(|e| DbError::RecordError(e.to_string()))?;
            Ok(())
        })
    }

    fn disconnect(&self) {
        let mut guard = self.session.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(session) = guard.take() {
            if let Err((_, e)) = session.conn.close() {
                log::debug!("Ignoring DuckDB close error: {}", e);
            }
        }
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
