//! Apply command implementation

use anyhow::{Context, Result};
use ro_core::{StatementResult, StatementStatus};
use ro_runner::{MigrationRunner, RunReport, RunnerOptions};
use serde::Serialize;

use crate::cli::{ApplyArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{self, ExitCode};

/// JSON shape of an apply run
#[derive(Debug, Serialize)]
struct ApplyOutput<'a> {
    ledger: &'a str,
    applied: usize,
    skipped: usize,
    results: &'a [StatementResult],
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Execute the apply command
pub async fn execute(args: &ApplyArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = common::load_context(global)?;
    let statements = ctx
        .config
        .collect_statements(&ctx.root)
        .context("Failed to collect statements")?;

    let options = RunnerOptions {
        report_skipped: args.report_skipped || ctx.config.report_skipped,
    };
    let ledger = ctx.target.ledger_table.clone();
    let engine = common::build_engine(&ctx.target.database);

    let runner = MigrationRunner::with_options(ledger.clone(), engine, options)
        .await
        .context("Failed to start migration runner")?;

    log::debug!(
        "Applying {} statements against ledger {}",
        statements.len(),
        ledger
    );
    let report = runner.run(&statements).await;

    match args.output {
        OutputFormat::Table => print_table(&report, statements.len()),
        OutputFormat::Json => print_json(&report, ledger.as_str())?,
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(ExitCode(1).into())
    }
}

fn print_table(report: &RunReport, total: usize) {
    if report.results.is_empty() && report.is_success() {
        println!("Nothing to apply ({} statements already applied)", total);
        return;
    }

    for result in &report.results {
        let marker = match result.status {
            StatementStatus::Applied => "✓",
            StatementStatus::Failed => "✗",
            StatementStatus::Skipped => "-",
        };
        let summary = common::summarize(&result.statement, 60);
        match &result.message {
            Some(message) => println!("  {} {} {} - {}", marker, result.hash, summary, message),
            None => println!("  {} {} {}", marker, result.hash, summary),
        }
    }

    println!();
    match &report.error {
        None => println!(
            "Applied {} statements, {} already applied",
            report.applied_count(),
            total - report.applied_count()
        ),
        Some(err) => {
            println!(
                "Applied {} statements before failure",
                report.applied_count()
            );
            eprintln!("Error: {}", err);
        }
    }
}

fn print_json(report: &RunReport, ledger: &str) -> Result<()> {
    let output = ApplyOutput {
        ledger,
        applied: report.applied_count(),
        skipped: report.skipped_count(),
        results: &report.results,
        error: report.error.as_ref().map(|e| e.to_string()),
    };
    let json = serde_json::to_string_pretty(&output).context("Failed to serialize results")?;
    println!("{}", json);
    Ok(())
}
