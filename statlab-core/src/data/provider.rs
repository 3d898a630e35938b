//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over data sources (stats API, cached
//! snapshots, CSV import, samples) so sources can be swapped and mocked for
//! tests. A provider is fully configured at construction; `fetch()` takes no
//! arguments.

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The three tables the application works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    /// Player points per finished round.
    Points,
    /// Current playing status and chance of featuring.
    Playing,
    /// Predicted points for the upcoming round.
    Forecast,
}

impl Dataset {
    pub const ALL: [Dataset; 3] = [Dataset::Points, Dataset::Playing, Dataset::Forecast];

    /// Canonical lowercase name, used in cache paths and CLI arguments.
    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Points => "points",
            Dataset::Playing => "playing",
            Dataset::Forecast => "forecast",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Dataset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "points" => Ok(Dataset::Points),
            "playing" => Ok(Dataset::Playing),
            "forecast" => Ok(Dataset::Forecast),
            other => Err(format!(
                "unknown dataset '{other}'. Valid: points, playing, forecast"
            )),
        }
    }
}

/// Structured error types for data operations.
///
/// These are designed to be displayable in CLI output and test failures.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by stats API (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("dataset '{dataset}' not served by the stats API")]
    DatasetUnavailable { dataset: Dataset },

    #[error("hard stop: stats API has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("csv import failed: {0}")]
    ImportFailed(String),

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("no cached snapshot for dataset '{dataset}' — run `fetch {dataset}` first")]
    NoCachedSnapshot { dataset: Dataset },

    #[error("data error: {0}")]
    Other(String),
}

/// Where a table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    StatsApi,
    CsvImport,
    Cache,
    Synthetic,
}

/// Trait for table providers (stats API, cached snapshots, samples).
///
/// Implementations handle the specifics of acquiring one dataset from a
/// particular source. Whatever configuration a source needs (endpoints,
/// directories, seeds) is injected at construction so the fetch itself is
/// zero-argument.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// The dataset this provider produces.
    fn dataset(&self) -> Dataset;

    /// Produce the table. May perform arbitrary I/O internally.
    fn fetch(&self) -> Result<DataFrame, DataError>;

    /// Check if the provider is currently usable (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}

/// Composes a primary provider with a fallback source.
///
/// On a primary fetch failure the error is reported and the fallback is
/// consulted. Only if both fail does an error escape — the primary's, since
/// that is the source the caller asked for.
pub struct FallbackProvider {
    primary: Box<dyn DataProvider>,
    fallback: Box<dyn DataProvider>,
}

impl FallbackProvider {
    pub fn new(primary: Box<dyn DataProvider>, fallback: Box<dyn DataProvider>) -> Self {
        Self { primary, fallback }
    }
}

impl DataProvider for FallbackProvider {
    fn name(&self) -> &str {
        self.primary.name()
    }

    fn dataset(&self) -> Dataset {
        self.primary.dataset()
    }

    fn fetch(&self) -> Result<DataFrame, DataError> {
        match self.primary.fetch() {
            Ok(df) => Ok(df),
            Err(primary_err) => {
                eprintln!(
                    "WARNING: {} failed ({primary_err}), falling back to {}",
                    self.primary.name(),
                    self.fallback.name()
                );
                self.fallback.fetch().map_err(|_| primary_err)
            }
        }
    }

    fn is_available(&self) -> bool {
        self.primary.is_available() || self.fallback.is_available()
    }
}

/// Progress callback for multi-dataset operations.
pub trait FetchProgress: Send {
    /// Called when starting to fetch a dataset.
    fn on_start(&self, dataset: Dataset, index: usize, total: usize);

    /// Called when a dataset fetch completes.
    fn on_complete(
        &self,
        dataset: Dataset,
        index: usize,
        total: usize,
        result: &Result<(), DataError>,
    );

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl FetchProgress for StdoutProgress {
    fn on_start(&self, dataset: Dataset, index: usize, total: usize) {
        println!("[{}/{}] Fetching {dataset}...", index + 1, total);
    }

    fn on_complete(
        &self,
        dataset: Dataset,
        _index: usize,
        _total: usize,
        result: &Result<(), DataError>,
    ) {
        match result {
            Ok(()) => println!("  OK: {dataset}"),
            Err(e) => println!("  FAIL: {dataset}: {e}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("\nFetch complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}
