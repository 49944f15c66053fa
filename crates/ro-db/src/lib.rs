//! ro-db - Storage engines for runonce
//!
//! This crate provides the `StorageEngine` trait the migration runner drives,
//! plus implementations for DuckDB and (with the `sqlite` feature) SQLite.

pub mod duckdb;
pub mod error;
pub(crate) mod ledger;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

pub use self::duckdb::DuckDbEngine;
pub use error::{DbError, DbResult};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteEngine;
pub use traits::StorageEngine;
