//! Migration runner.
//!
//! Applies an ordered list of statements exactly once per ledger. A statement
//! is identified by the MD5 of its exact text; statements already recorded are
//! skipped, the rest are executed and then recorded. Execution and recording
//! are two separate engine calls, so a failure between them leaves an
//! executed statement unrecorded and it will run again on the next start.

use crate::error::{RunnerError, RunnerResult};
use crate::report::RunReport;
use ro_core::{LedgerName, StatementHash, StatementResult};
use ro_db::{DbResult, StorageEngine};
use std::sync::Arc;

/// Runner behaviour switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Emit a `Skipped` result for statements already in the ledger instead
    /// of omitting them
    pub report_skipped: bool,
}

/// Disconnects the engine when dropped, on every exit path of a run.
struct DisconnectGuard<'a>(&'a dyn StorageEngine);

impl Drop for DisconnectGuard<'_> {
    fn drop(&mut self) {
        self.0.disconnect();
    }
}

/// Applies statements exactly once against a prepared storage engine
pub struct MigrationRunner {
    ledger: LedgerName,
    engine: Arc<dyn StorageEngine>,
    options: RunnerOptions,
}

impl MigrationRunner {
    /// Bind `engine` and prepare `ledger` with default options.
    pub async fn new(ledger: LedgerName, engine: Arc<dyn StorageEngine>) -> RunnerResult<Self> {
        Self::with_options(ledger, engine, RunnerOptions::default()).await
    }

    /// Bind `engine` and prepare `ledger`.
    ///
    /// When preparation fails the engine is disconnected and no runner is
    /// returned.
    pub async fn with_options(
        ledger: LedgerName,
        engine: Arc<dyn StorageEngine>,
        options: RunnerOptions,
    ) -> RunnerResult<Self> {
        if let Err(source) = engine.prepare_connection(ledger.as_str()).await {
            engine.disconnect();
            return Err(RunnerError::Prepare {
                ledger: ledger.to_string(),
                source,
            });
        }

        Ok(Self {
            ledger,
            engine,
            options,
        })
    }

    /// Ledger table this runner records into
    pub fn ledger(&self) -> &LedgerName {
        &self.ledger
    }

    /// Apply `statements` in order, stopping at the first failure.
    ///
    /// Consumes the runner: the engine is disconnected exactly once when the
    /// run ends, whether it succeeded or not.
    pub async fn run<S: AsRef<str>>(self, statements: &[S]) -> RunReport {
        let _release = DisconnectGuard(self.engine.as_ref());
        let mut results = Vec::new();

        for statement in statements {
            let statement = statement.as_ref();
            let hash = StatementHash::of(statement);

            match self.apply_one(statement, &hash).await {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(source) => {
                    log::error!("Statement {} failed ({}): {}", hash, source.kind(), source);
                    results.push(StatementResult::failed(
                        statement,
                        hash.clone(),
                        source.to_string(),
                    ));
                    return RunReport {
                        results,
                        error: Some(RunnerError::Statement {
                            hash,
                            statement: statement.to_string(),
                            source,
                        }),
                    };
                }
            }
        }

        log::info!(
            "Ledger {}: {} of {} statements applied",
            self.ledger,
            results.iter().filter(|r| r.is_success()).count(),
            statements.len()
        );
        RunReport {
            results,
            error: None,
        }
    }

    /// Look up, execute, and record one statement.
    ///
    /// Returns `None` for an already-applied statement unless skips are reported.
    async fn apply_one(
        &self,
        statement: &str,
        hash: &StatementHash,
    ) -> DbResult<Option<StatementResult>> {
        if self.engine.is_applied(hash).await? {
            log::debug!("Skipping {} (already applied)", hash);
            return Ok(self
                .options
                .report_skipped
                .then(|| StatementResult::skipped(statement, hash.clone())));
        }

        log::debug!("Applying {}", hash);
        self.engine.execute_statement(statement).await?;

        if let Err(e) = self.engine.record_applied(hash, statement).await {
            log::warn!(
                "Statement {} was executed but not recorded in ledger {}; it will run again on the next start unless recorded manually",
                hash,
                self.ledger
            );
            return Err(e);
        }

        Ok(Some(StatementResult::applied(statement, hash.clone())))
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
