//! ro-core - Core library for runonce
//!
//! This crate provides the types shared by every runonce component: the
//! statement digest used as the ledger key, the ledger table name, the
//! per-statement run results, and `runonce.yml` configuration parsing.

pub mod config;
pub mod error;
pub mod hash;
pub mod ledger_name;
pub mod result;

pub use config::{Config, DatabaseConfig, DbType, ResolvedTarget, TargetConfig};
pub use error::{CoreError, CoreResult};
pub use hash::StatementHash;
pub use ledger_name::LedgerName;
pub use result::{StatementResult, StatementStatus};

/// Maximum number of characters the ledger can record for one statement.
///
/// Longer statements still execute but fail to record.
pub const LEDGER_STATEMENT_MAX_LEN: usize = 600;

/// Ledger table name used when none is configured.
pub const DEFAULT_LEDGER_TABLE: &str = "migrations";
