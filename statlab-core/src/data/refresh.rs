//! Refresh orchestrator — coordinates multi-dataset fetches with progress
//! reporting.

use super::cache::SnapshotCache;
use super::ingest;
use super::provider::{DataError, DataProvider, Dataset, FetchProgress};
use super::schema::TableSchema;
use chrono::NaiveDate;
use polars::prelude::IntoLazy;

/// Refresh snapshots for each provider's dataset, running fetches through
/// the clean-validate-cache pipeline.
///
/// Returns a summary of successes and failures.
pub fn refresh_datasets(
    providers: &[&dyn DataProvider],
    cache: &SnapshotCache,
    as_of: NaiveDate,
    force: bool,
    progress: &dyn FetchProgress,
) -> RefreshSummary {
    let total = providers.len();
    let mut succeeded = 0;
    let mut failed = 0;
    let mut errors: Vec<(Dataset, DataError)> = Vec::new();

    for (i, provider) in providers.iter().enumerate() {
        let dataset = provider.dataset();
        progress.on_start(dataset, i, total);

        // Skip if an up-to-date snapshot exists and not forcing
        if !force {
            if let Some(meta) = cache.get_meta(dataset) {
                if meta.as_of >= as_of {
                    progress.on_complete(dataset, i, total, &Ok(()));
                    succeeded += 1;
                    continue;
                }
            }
        }

        let result = refresh_single(*provider, cache, as_of);
        progress.on_complete(dataset, i, total, &result);

        match result {
            Ok(()) => succeeded += 1,
            Err(e) => {
                errors.push((dataset, e));
                failed += 1;
            }
        }

        // Bail out early if circuit breaker tripped
        if !provider.is_available() {
            for remaining in &providers[(i + 1)..total] {
                errors.push((remaining.dataset(), DataError::CircuitBreakerTripped));
                failed += 1;
            }
            break;
        }
    }

    progress.on_batch_complete(succeeded, failed, total);

    RefreshSummary {
        total,
        succeeded,
        failed,
        errors,
    }
}

/// Refresh a single dataset: fetch → clean → validate → cache.
fn refresh_single(
    provider: &dyn DataProvider,
    cache: &SnapshotCache,
    as_of: NaiveDate,
) -> Result<(), DataError> {
    let dataset = provider.dataset();
    let fetched = provider.fetch()?;

    let df = ingest::clean(dataset, fetched.lazy())
        .collect()
        .map_err(|e| DataError::ValidationError(format!("clean {dataset}: {e}")))?;

    TableSchema::validate(dataset, &df).map_err(|e| DataError::ValidationError(e.to_string()))?;

    if df.height() == 0 {
        return Err(DataError::ValidationError(format!(
            "{dataset}: fetched table has no rows"
        )));
    }

    cache.write(dataset, &df, as_of, provider.name())?;
    Ok(())
}

/// Summary of a batch refresh operation.
#[derive(Debug)]
pub struct RefreshSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<(Dataset, DataError)>,
}

impl RefreshSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}
