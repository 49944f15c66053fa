//! SQLite storage engine implementation

use crate::error::{DbError, DbResult};
use crate::ledger::{insert_sql, lookup_sql, split_qualified, unquote};
use crate::traits::StorageEngine;
use async_trait::async_trait;
use ro_core::{StatementHash, LEDGER_STATEMENT_MAX_LEN};
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

const MEMORY_DESCRIPTOR: &str = ":memory:";

struct Session {
    conn: Connection,
    ledger: String,
}

/// SQLite storage engine
///
/// The descriptor is a database file path or `:memory:`. Only the built-in
/// `main` and `temp` schemas exist on a fresh connection, so any other
/// schema-qualified ledger name fails with `SchemaError`.
pub struct SqliteEngine {
    descriptor: String,
    session: Mutex<Option<Session>>,
}

impl SqliteEngine {
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
            Connection::open(&self.descriptor)
        };
        opened.map_err(|e| DbError::ConnectionError(format!("{}: {}", e, self.descriptor)))
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Option<Session>>> {
        self.session
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn with_session<T>(&self, f: impl FnOnce(&Session) -> DbResult<T>) -> DbResult<T> {
        let guard = self.lock()?;
        let session = guard.as_ref().ok_or(DbError::NotConnected)?;
        f(session)
    }

    /// Table names in SQLite match case-insensitively, quoted or not.
    fn ledger_exists_sync(conn: &Connection, ledger: &str) -> DbResult<bool> {
        let (schema, table) = split_qualified(ledger, "main");
        let sql = format!(
            "SELECT COUNT(*) FROM {}.sqlite_master WHERE type = 'table' AND name = ? COLLATE NOCASE",
            schema
        );

        let count: i64 = conn
            .query_row(&sql, rusqlite::params![unquote(table)], |row| row.get(0))
            .map_err(|e| DbError::SchemaError(e.to_string()))?;

        Ok(count > 0)
    }

    fn create_ledger_sync(conn: &Connection, ledger: &str) -> DbResult<()> {
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {ledger} (
                 id         INTEGER PRIMARY KEY AUTOINCREMENT,
                 hash       CHAR({hash_len}) NOT NULL UNIQUE CHECK (length(hash) = {hash_len}),
                 statement  VARCHAR({max_len}) NOT NULL CHECK (length(statement) <= {max_len}),
                 created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
             );",
            ledger = ledger,
            hash_len = StatementHash::HEX_LEN,
            max_len = LEDGER_STATEMENT_MAX_LEN,
        );

        conn.execute_batch(&ddl)
            .map_err(|e| DbError::SchemaError(format!("failed to create ledger {}: {}", ledger, e)))
    }
}

#[async_trait]
impl StorageEngine for SqliteEngine {
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
                .query_row(
                    &lookup_sql(&s.ledger),
                    rusqlite::params![hash.as_str()],
                    |row| row.get(0),
                )
                .map_err(|e| DbError::LookupError(e.to_string()))?;
            Ok(count > 0)
        })
    }

    async fn record_applied(&self, hash: &StatementHash, statement: &str) -> DbResult<()> {
        self.with_session(|s| {
            s.conn
                .execute(
                    &insert_sql(&s.ledger),
                    rusqlite::params![hash.as_str(), statement],
                )
                .map_err(|e| DbError::RecordError(e.to_string()))?;
            Ok(())
        })
    }

    fn disconnect(&self) {
        let mut guard = self.session.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(session) = guard.take() {
            if let Err((_, e)) = session.conn.close() {
                log::debug!("Ignoring SQLite close error: {}", e);
            }
        }
    }
}

#[cfg(test)]
#[path = "sqlite_test.rs"]
mod tests;
