//! Hash command implementation

use anyhow::Result;
use ro_core::StatementHash;

use crate::cli::HashArgs;

/// Execute the hash command
pub fn execute(args: &HashArgs) -> Result<()> {
    println!("{}", StatementHash::of(&args.statement));
    Ok(())
}
