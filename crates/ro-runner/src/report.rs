//! Outcome of a single run.

use crate::error::RunnerError;
use ro_core::{StatementResult, StatementStatus};

/// Results of one run plus the error that stopped it, if any.
///
/// `results` always holds everything that happened before the stop, including
/// the failed statement itself; statements after it are absent.
#[derive(Debug)]
pub struct RunReport {
    /// Per-statement results in input order
    pub results: Vec<StatementResult>,

    /// First error encountered; `None` when every statement succeeded or was skipped
    pub error: Option<RunnerError>,
}

impl RunReport {
    /// True when the run finished without error
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Number of statements executed and recorded during this run
    pub fn applied_count(&self) -> usize {
        self.count(StatementStatus::Applied)
    }

    /// Number of skipped statements reported (zero unless skips are reported)
    pub fn skipped_count(&self) -> usize {
        self.count(StatementStatus::Skipped)
    }

    fn count(&self, status: StatementStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Collapse into a `Result`, dropping the partial results on failure
    pub fn into_result(self) -> Result<Vec<StatementResult>, RunnerError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.results),
        }
    }
}
