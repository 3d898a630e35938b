//! Availability harness — verifies that data producers yield non-empty
//! tables.
//!
//! The checker itself is deliberately thin: invoke a zero-argument producer
//! once, inspect the row count of whatever comes back. It holds no state,
//! performs no retries, and caches nothing. A producer error is not caught
//! here — it aborts the check and reaches the caller unchanged, keeping
//! "provider unavailable" distinct from "provider returned no rows".

use crate::data::provider::{DataError, DataProvider, Dataset};
use polars::prelude::DataFrame;

/// Reason attached to a failed check when the table had no rows.
pub const EMPTY_RESULT: &str = "empty result";

/// Capability required of any tabular container the harness can inspect.
pub trait Tabular {
    /// Number of rows in the table.
    fn row_count(&self) -> usize;
}

impl Tabular for DataFrame {
    fn row_count(&self) -> usize {
        self.height()
    }
}

/// Verdict of a single availability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail { reason: String },
}

impl Outcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }
}

/// Invoke `producer` once and verify the returned table is non-empty.
///
/// A producer error propagates unchanged — no `Outcome` is produced for it.
pub fn check_non_empty<T, E, F>(producer: F) -> Result<Outcome, E>
where
    T: Tabular,
    F: FnOnce() -> Result<T, E>,
{
    let table = producer()?;
    if table.row_count() > 0 {
        Ok(Outcome::Pass)
    } else {
        Ok(Outcome::Fail {
            reason: EMPTY_RESULT.to_string(),
        })
    }
}

/// How one dataset fared in a batch verification run.
#[derive(Debug)]
pub enum Verdict {
    /// Provider produced a table with at least one row.
    Pass,
    /// Provider produced a table with no rows.
    Empty { reason: String },
    /// The provider call itself failed; the check was aborted.
    ProviderError(DataError),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// Verdict for a single dataset, with provenance.
#[derive(Debug)]
pub struct DatasetVerdict {
    pub dataset: Dataset,
    pub provider: String,
    pub verdict: Verdict,
}

/// Results of verifying a batch of providers.
#[derive(Debug)]
pub struct VerifySummary {
    pub results: Vec<DatasetVerdict>,
}

impl VerifySummary {
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.verdict.is_pass())
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.verdict.is_pass()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }
}

/// Run the non-empty check against each provider in turn.
///
/// Checks are sequential and independent; one dataset's hard failure is
/// collected into its verdict rather than stopping the rest, so a single
/// run reports on every dataset.
pub fn verify_datasets(providers: &[&dyn DataProvider]) -> VerifySummary {
    let mut results = Vec::with_capacity(providers.len());

    for provider in providers {
        let verdict = match check_non_empty(|| provider.fetch()) {
            Ok(Outcome::Pass) => Verdict::Pass,
            Ok(Outcome::Fail { reason }) => Verdict::Empty { reason },
            Err(e) => Verdict::ProviderError(e),
        };
        results.push(DatasetVerdict {
            dataset: provider.dataset(),
            provider: provider.name().to_string(),
            verdict,
        });
    }

    VerifySummary { results }
}
