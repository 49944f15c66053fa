//! Configuration types and parsing for runonce.yml

use crate::error::{CoreError, CoreResult};
use crate::ledger_name::LedgerName;
use crate::LEDGER_STATEMENT_MAX_LEN;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Environment variable consulted when no `--target` flag is given.
pub const TARGET_ENV_VAR: &str = "RUNONCE_TARGET";

/// Main project configuration from runonce.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Table recording applied statement hashes
    #[serde(default)]
    pub ledger_table: LedgerName,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Statements written inline; applied before `statement_files`
    #[serde(default)]
    pub statements: Vec<String>,

    /// Files holding one statement each, relative to the project directory
    #[serde(default)]
    pub statement_files: Vec<String>,

    /// Report already-applied statements as `skipped` instead of omitting them
    #[serde(default)]
    pub report_skipped: bool,

    /// Named target configurations (e.g., dev, staging, prod)
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,
}

/// Target-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Database configuration override
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Ledger table override
    #[serde(default)]
    pub ledger_table: Option<LedgerName>,
}

/// Database engine selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// DuckDB (default)
    #[default]
    DuckDb,
    /// SQLite
    Sqlite,
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::DuckDb => write!(f, "duckdb"),
            DbType::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Engine type (duckdb or sqlite)
    #[serde(rename = "type", default)]
    pub db_type: DbType,

    /// Connection descriptor handed to the engine unmodified
    /// (a file path or `:memory:` for the bundled engines)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl DatabaseConfig {
    /// Whether the descriptor names an in-memory database, whose ledger is
    /// gone as soon as the connection closes
    pub fn is_in_memory(&self) -> bool {
        self.path == DEFAULT_DB_PATH
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DbType::default(),
            path: default_db_path(),
        }
    }
}

const DEFAULT_DB_PATH: &str = ":memory:";

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

/// Database and ledger settings after target overrides are applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Database to connect to
    pub database: DatabaseConfig,
    /// Ledger table to use
    pub ledger_table: LedgerName,
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for runonce.yml or runonce.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("runonce.yml");
        let yaml_path = dir.join("runonce.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.database.path.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "database.path cannot be empty".to_string(),
            });
        }

        for (name, target) in &self.targets {
            if target.database.as_ref().is_some_and(|db| db.path.is_empty()) {
                return Err(CoreError::ConfigInvalid {
                    message: format!("targets.{}.database.path cannot be empty", name),
                });
            }
        }

        if let Some(file) = self.statement_files.iter().find(|f| f.trim().is_empty()) {
            return Err(CoreError::ConfigInvalid {
                message: format!("statement_files contains an empty path: {:?}", file),
            });
        }

        Ok(())
    }

    /// Get the list of available target names, sorted
    pub fn available_targets(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.targets.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Resolve database and ledger settings, applying target overrides
    ///
    /// Fields a target leaves unset fall back to the base configuration.
    pub fn resolve(&self, target: Option<&str>) -> CoreResult<ResolvedTarget> {
        let Some(name) = target else {
            return Ok(ResolvedTarget {
                database: self.database.clone(),
                ledger_table: self.ledger_table.clone(),
            });
        };

        let target_config = self
            .targets
            .get(name)
            .ok_or_else(|| CoreError::ConfigInvalid {
                message: format!(
                    "Target '{}' not found. Available targets: {}",
                    name,
                    self.available_targets().join(", ")
                ),
            })?;

        Ok(ResolvedTarget {
            database: target_config
                .database
                .clone()
                .unwrap_or_else(|| self.database.clone()),
            ledger_table: target_config
                .ledger_table
                .clone()
                .unwrap_or_else(|| self.ledger_table.clone()),
        })
    }

    /// Resolve target from CLI flag or RUNONCE_TARGET environment variable
    ///
    /// Priority: CLI flag > RUNONCE_TARGET env var > None
    pub fn resolve_target_name(cli_target: Option<&str>) -> Option<String> {
        cli_target
            .map(String::from)
            .or_else(|| std::env::var(TARGET_ENV_VAR).ok())
    }

    /// Collect every configured statement in application order.
    ///
    /// Inline `statements` come first, followed by the contents of each
    /// `statement_files` entry (resolved against `root`) in listed order.
    /// File contents are trimmed of surrounding whitespace so editor newlines
    /// do not change the statement hash. Empty files are rejected.
    pub fn collect_statements(&self, root: &Path) -> CoreResult<Vec<String>> {
        let mut statements = self.statements.clone();

        for file in &self.statement_files {
            let path = root.join(file);
            let content =
                std::fs::read_to_string(&path).map_err(|e| CoreError::IoWithPath {
                    path: path.display().to_string(),
                    source: e,
                })?;
            let statement = content.trim();
            if statement.is_empty() {
                return Err(CoreError::StatementFile {
                    path: path.display().to_string(),
                    reason: "file is empty".to_string(),
                });
            }
            statements.push(statement.to_string());
        }

        for statement in &statements {
            let len = statement.chars().count();
            if len > LEDGER_STATEMENT_MAX_LEN {
                log::warn!(
                    "Statement of {} characters exceeds the ledger limit of {}; it will execute but cannot be recorded",
                    len,
                    LEDGER_STATEMENT_MAX_LEN
                );
            }
        }

        Ok(statements)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
