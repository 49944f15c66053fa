//! ro-runner - Exactly-once statement application for runonce
//!
//! [`MigrationRunner`] hashes each statement, skips the ones already present
//! in the ledger, executes the rest in order, and records them. It stops at
//! the first failure and always releases the engine's connection.

pub mod error;
pub mod report;
pub mod runner;

pub use error::{RunnerError, RunnerResult};
pub use report::RunReport;
pub use runner::{MigrationRunner, RunnerOptions};
