//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use ro_core::config::{Config, DatabaseConfig, DbType, ResolvedTarget};
use ro_db::{DuckDbEngine, SqliteEngine, StorageEngine};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that destructors (and engine disconnects) run first.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; the command already printed what went wrong.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Everything a command needs after config and target resolution
pub(crate) struct CommandContext {
    pub(crate) config: Config,
    pub(crate) root: PathBuf,
    pub(crate) target: ResolvedTarget,
}

/// Load the config, resolve the target, and apply CLI overrides.
pub(crate) fn load_context(global: &GlobalArgs) -> Result<CommandContext> {
    let root = PathBuf::from(&global.project_dir);
    let config = match &global.config {
        Some(path) => Config::load(Path::new(path)),
        None => Config::load_from_dir(&root),
    }
    .context("Failed to load config")?;

    let target_name = Config::resolve_target_name(global.target.as_deref());
    let mut target = config
        .resolve(target_name.as_deref())
        .context("Failed to resolve target")?;

    if let Some(descriptor) = &global.database {
        target.database.path = descriptor.clone();
    }

    if target.database.is_in_memory() {
        log::warn!(
            "Database is in-memory; the ledger {} is discarded on exit and every statement runs again next time. Set database.path to persist it",
            target.ledger_table
        );
    }

    log::debug!(
        "Using {} database {} with ledger {}",
        target.database.db_type,
        target.database.path,
        target.ledger_table
    );

    Ok(CommandContext {
        config,
        root,
        target,
    })
}

/// Create the storage engine for a database configuration.
pub(crate) fn build_engine(database: &DatabaseConfig) -> Arc<dyn StorageEngine> {
    match database.db_type {
        DbType::DuckDb => Arc::new(DuckDbEngine::new(&database.path)),
        DbType::Sqlite => Arc::new(SqliteEngine::new(&database.path)),
    }
}

/// Shorten a statement to its first line, at most `max` characters.
pub(crate) fn summarize(statement: &str, max: usize) -> String {
    let first_line = statement.lines().next().unwrap_or("").trim();
    let truncated = first_line.chars().count() > max || statement.trim().contains('\n');
    if !truncated {
        return first_line.to_string();
    }
    let head: String = first_line.chars().take(max).collect();
    format!("{}…", head)
}
