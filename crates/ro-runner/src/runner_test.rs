use super::*;
use async_trait::async_trait;
use ro_core::StatementStatus;
use ro_db::DbError;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// ── Scripted engine ────────────────────────────────────────────────────

/// In-memory engine that records every call and fails on demand.
#[derive(Default)]
struct ScriptedEngine {
    ledger: Mutex<HashSet<String>>,
    executed: Mutex<Vec<String>>,
    calls: Mutex<Vec<String>>,
    disconnects: AtomicUsize,
    fail_prepare: bool,
    fail_lookup: Option<&'static str>,
    fail_execute: Option<&'static str>,
    fail_record: Option<&'static str>,
}

impl ScriptedEngine {
    fn with_applied(statements: &[&str]) -> Self {
        let engine = Self::default();
        {
            let mut ledger = engine.ledger.lock().unwrap();
            for s in statements {
                ledger.insert(StatementHash::of(s).to_string());
            }
        }
        engine
    }

    fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    fn hits(target: Option<&'static str>, hash: &StatementHash) -> bool {
        target.is_some_and(|s| StatementHash::of(s) == *hash)
    }
}

#[async_trait]
impl StorageEngine for ScriptedEngine {
    async fn prepare_connection(&self, ledger: &str) -> DbResult<()> {
        self.calls.lock().unwrap().push(format!("prepare {ledger}"));
        if self.fail_prepare {
            return Err(DbError::ConnectionError("unreachable".to_string()));
        }
        Ok(())
    }

    async fn execute_statement(&self, sql: &str) -> DbResult<()> {
        self.calls.lock().unwrap().push(format!("execute {sql}"));
        if self.fail_execute == Some(sql) {
            return Err(DbError::ExecutionError("syntax error".to_string()));
        }
        self.executed.lock().unwrap().push(sql.to_string());
        Ok(())
    }

    async fn is_applied(&self, hash: &StatementHash) -> DbResult<bool> {
        self.calls.lock().unwrap().push(format!("lookup {hash}"));
        if Self::hits(self.fail_lookup, hash) {
            return Err(DbError::LookupError("lookup broke".to_string()));
        }
        Ok(self.ledger.lock().unwrap().contains(hash.as_str()))
    }

    async fn record_applied(&self, hash: &StatementHash, _statement: &str) -> DbResult<()> {
        self.calls.lock().unwrap().push(format!("record {hash}"));
        if Self::hits(self.fail_record, hash) {
            return Err(DbError::RecordError("insert broke".to_string()));
        }
        self.ledger.lock().unwrap().insert(hash.to_string());
        Ok(())
    }

    fn disconnect(&self) {
        self.calls.lock().unwrap().push("disconnect".to_string());
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

async fn runner(engine: &Arc<ScriptedEngine>) -> MigrationRunner {
    MigrationRunner::new(LedgerName::new("migrations"), engine.clone())
        .await
        .unwrap()
}

// ── Construction ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_new_prepares_ledger() {
    let engine = Arc::new(ScriptedEngine::default());
    let runner = runner(&engine).await;
    assert_eq!(runner.ledger(), &LedgerName::new("migrations"));
    assert_eq!(engine.calls(), vec!["prepare migrations"]);
    assert_eq!(engine.disconnects(), 0);
}

#[tokio::test]
async fn test_new_propagates_prepare_failure() {
    let engine = Arc::new(ScriptedEngine {
        fail_prepare: true,
        ..Default::default()
    });
    let err = MigrationRunner::new(LedgerName::new("migrations"), engine.clone())
        .await
        .err()
        .unwrap();

    assert!(matches!(
        err,
        RunnerError::Prepare {
            source: DbError::ConnectionError(_),
            ..
        }
    ));
    assert!(err.to_string().contains("migrations"));
    assert!(err.statement().is_none());
    assert_eq!(engine.disconnects(), 1);
}

// ── Run protocol ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_run_applies_in_order() {
    let engine = Arc::new(ScriptedEngine::default());
    let report = runner(&engine).await.run(&["A", "B", "C"]).await;

    assert!(report.is_success());
    assert_eq!(report.applied_count(), 3);
    let statements: Vec<&str> = report.results.iter().map(|r| r.statement.as_str()).collect();
    assert_eq!(statements, vec!["A", "B", "C"]);
    assert!(report.results.iter().all(|r| r.is_success() && r.message.is_none()));
    assert_eq!(report.results[1].hash, StatementHash::of("B"));
    assert_eq!(engine.executed(), vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_run_calls_engine_in_protocol_order() {
    let engine = Arc::new(ScriptedEngine::default());
    let _ = runner(&engine).await.run(&["A"]).await;

    let hash = StatementHash::of("A");
    assert_eq!(
        engine.calls(),
        vec![
            "prepare migrations".to_string(),
            format!("lookup {hash}"),
            "execute A".to_string(),
            format!("record {hash}"),
            "disconnect".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_run_omits_already_applied() {
    let engine = Arc::new(ScriptedEngine::with_applied(&["A", "C"]));
    let report = runner(&engine).await.run(&["A", "B", "C"]).await;

    assert!(report.is_success());
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].statement, "B");
    assert_eq!(engine.executed(), vec!["B"]);
}

#[tokio::test]
async fn test_run_reports_skipped_when_requested() {
    let engine = Arc::new(ScriptedEngine::with_applied(&["A"]));
    let runner = MigrationRunner::with_options(
        LedgerName::new("migrations"),
        engine.clone(),
        RunnerOptions {
            report_skipped: true,
        },
    )
    .await
    .unwrap();
    let report = runner.run(&["A", "B"]).await;

    let statuses: Vec<StatementStatus> = report.results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![StatementStatus::Skipped, StatementStatus::Applied]
    );
    assert_eq!(report.skipped_count(), 1);
    assert_eq!(report.applied_count(), 1);
    assert_eq!(engine.executed(), vec!["B"]);
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let engine = Arc::new(ScriptedEngine::default());
    let first = runner(&engine).await.run(&["A", "B"]).await;
    assert_eq!(first.applied_count(), 2);

    let second = runner(&engine).await.run(&["A", "B"]).await;
    assert!(second.is_success());
    assert!(second.results.is_empty());
    assert_eq!(engine.executed(), vec!["A", "B"]);
}

#[tokio::test]
async fn test_duplicate_statement_in_one_run_applies_once() {
    let engine = Arc::new(ScriptedEngine::default());
    let report = runner(&engine).await.run(&["A", "A"]).await;

    assert!(report.is_success());
    assert_eq!(report.results.len(), 1);
    assert_eq!(engine.executed(), vec!["A"]);
}

#[tokio::test]
async fn test_empty_run() {
    let engine = Arc::new(ScriptedEngine::default());
    let statements: [&str; 0] = [];
    let report = runner(&engine).await.run(&statements).await;

    assert!(report.is_success());
    assert!(report.results.is_empty());
    assert_eq!(engine.disconnects(), 1);
}

#[tokio::test]
async fn test_run_accepts_owned_strings() {
    let engine = Arc::new(ScriptedEngine::default());
    let statements = vec!["A".to_string(), "B".to_string()];
    let report = runner(&engine).await.run(&statements).await;
    assert_eq!(report.applied_count(), 2);
}

// ── Failure paths ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_execution_failure_stops_run() {
    let engine = Arc::new(ScriptedEngine {
        fail_execute: Some("B"),
        ..Default::default()
    });
    let report = runner(&engine).await.run(&["A", "B", "C"]).await;

    assert_eq!(report.results.len(), 2);
    assert!(report.results[0].is_success());
    assert_eq!(report.results[1].status, StatementStatus::Failed);
    assert_eq!(report.results[1].statement, "B");
    assert!(report.results[1]
        .message
        .as_deref()
        .unwrap()
        .contains("syntax error"));

    let err = report.error.as_ref().unwrap();
    assert_eq!(err.statement(), Some("B"));
    assert!(matches!(err.db_error(), DbError::ExecutionError(_)));
    assert!(matches!(
        err,
        RunnerError::Statement { hash, .. } if *hash == StatementHash::of("B")
    ));

    assert_eq!(engine.executed(), vec!["A"]);
    assert!(!engine.calls().iter().any(|c| c == "execute C"));
    assert_eq!(engine.disconnects(), 1);
}

#[tokio::test]
async fn test_lookup_failure_stops_before_execution() {
    let engine = Arc::new(ScriptedEngine {
        fail_lookup: Some("B"),
        ..Default::default()
    });
    let report = runner(&engine).await.run(&["A", "B", "C"]).await;

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.results[1].status, StatementStatus::Failed);
    assert!(matches!(
        report.error.as_ref().unwrap().db_error(),
        DbError::LookupError(_)
    ));
    assert_eq!(engine.executed(), vec!["A"]);
    assert_eq!(engine.disconnects(), 1);
}

#[tokio::test]
async fn test_record_failure_after_execution() {
    let engine = Arc::new(ScriptedEngine {
        fail_record: Some("A"),
        ..Default::default()
    });
    let report = runner(&engine).await.run(&["A", "B"]).await;

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].status, StatementStatus::Failed);
    assert!(matches!(
        report.error.as_ref().unwrap().db_error(),
        DbError::RecordError(_)
    ));
    // Executed but unrecorded; B never attempted
    assert_eq!(engine.executed(), vec!["A"]);
    assert!(!engine
        .ledger
        .lock()
        .unwrap()
        .contains(StatementHash::of("A").as_str()));
    assert_eq!(engine.disconnects(), 1);
}

#[tokio::test]
async fn test_into_result() {
    let engine = Arc::new(ScriptedEngine::default());
    let ok = runner(&engine).await.run(&["A"]).await.into_result().unwrap();
    assert_eq!(ok.len(), 1);

    let engine = Arc::new(ScriptedEngine {
        fail_execute: Some("X"),
        ..Default::default()
    });
    let err = runner(&engine)
        .await
        .run(&["X"])
        .await
        .into_result()
        .unwrap_err();
    assert!(err.to_string().contains(StatementHash::of("X").as_str()));
}
