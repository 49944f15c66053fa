//! Status command implementation

use anyhow::{Context, Result};
use ro_core::StatementHash;
use ro_db::StorageEngine;
use serde::Serialize;

use crate::cli::{GlobalArgs, OutputFormat, StatusArgs};
use crate::commands::common;

/// Ledger state of one configured statement
#[derive(Debug, Serialize)]
struct StatementState {
    hash: StatementHash,
    applied: bool,
    statement: String,
}

/// Execute the status command
///
/// Prepares the ledger (creating it when missing) but never executes a
/// configured statement.
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = common::load_context(global)?;
    let statements = ctx
        .config
        .collect_statements(&ctx.root)
        .context("Failed to collect statements")?;

    let engine = common::build_engine(&ctx.target.database);
    let states = lookup_states(engine.as_ref(), ctx.target.ledger_table.as_str(), statements).await;
    engine.disconnect();
    let states = states?;

    match args.output {
        OutputFormat::Table => {
            for state in &states {
                let marker = if state.applied { "applied" } else { "pending" };
                println!(
                    "  {:<8} {} {}",
                    marker,
                    state.hash,
                    common::summarize(&state.statement, 60)
                );
            }
            let applied = states.iter().filter(|s| s.applied).count();
            println!();
            println!(
                "{} applied, {} pending in ledger {}",
                applied,
                states.len() - applied,
                ctx.target.ledger_table
            );
        }
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&states).context("Failed to serialize status")?;
            println!("{}", json);
        }
    }

    Ok(())
}

async fn lookup_states(
    engine: &dyn StorageEngine,
    ledger: &str,
    statements: Vec<String>,
) -> Result<Vec<StatementState>> {
    engine
        .prepare_connection(ledger)
        .await
        .with_context(|| format!("Failed to prepare ledger '{}'", ledger))?;

    let mut states = Vec::with_capacity(statements.len());
    for statement in statements {
        let hash = StatementHash::of(&statement);
        let applied = engine
            .is_applied(&hash)
            .await
            .with_context(|| format!("Failed to look up {}", hash))?;
        states.push(StatementState {
            hash,
            applied,
            statement,
        });
    }
    Ok(states)
}
