//! The three application tables resolve through real providers and are
//! non-empty.

use chrono::NaiveDate;
use statlab_core::check::{check_non_empty, Outcome};
use statlab_core::config::ApiConfig;
use statlab_core::data::sample::sample_table;
use statlab_core::data::{
    CircuitBreaker, DataProvider, Dataset, FallbackProvider, PointsProvider, SnapshotCache,
    SnapshotProvider, StatsApi,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_cache_dir() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "statlab_availability_test_{}_{id}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn seeded_cache(dir: &PathBuf, dataset: Dataset) {
    let cache = SnapshotCache::new(dir);
    let as_of = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
    cache
        .write(dataset, &sample_table(dataset), as_of, "fixture")
        .unwrap();
}

fn assert_snapshot_has_rows(dataset: Dataset) {
    let dir = temp_cache_dir();
    seeded_cache(&dir, dataset);

    let provider = SnapshotProvider::new(&dir, dataset);
    let outcome = check_non_empty(|| provider.fetch()).unwrap();

    assert_eq!(outcome, Outcome::Pass);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn points_table_has_rows() {
    assert_snapshot_has_rows(Dataset::Points);
}

#[test]
fn playing_table_has_rows() {
    assert_snapshot_has_rows(Dataset::Playing);
}

#[test]
fn forecast_table_has_rows() {
    assert_snapshot_has_rows(Dataset::Forecast);
}

#[test]
fn unreachable_api_falls_back_to_cached_snapshot() {
    let dir = temp_cache_dir();
    seeded_cache(&dir, Dataset::Points);

    // Port 9 (discard) refuses connections immediately; no retries
    let api_config = ApiConfig {
        base_url: "http://127.0.0.1:9".into(),
        timeout_secs: 1,
        max_retries: 0,
    };
    let api = Arc::new(StatsApi::from_config(
        &api_config,
        Arc::new(CircuitBreaker::default_api()),
    ));

    let provider = FallbackProvider::new(
        Box::new(PointsProvider::new(api)),
        Box::new(SnapshotProvider::new(&dir, Dataset::Points)),
    );

    let outcome = check_non_empty(|| provider.fetch()).unwrap();
    assert_eq!(outcome, Outcome::Pass);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unreachable_api_without_snapshot_aborts_the_check() {
    let dir = temp_cache_dir();

    let api_config = ApiConfig {
        base_url: "http://127.0.0.1:9".into(),
        timeout_secs: 1,
        max_retries: 0,
    };
    let api = Arc::new(StatsApi::from_config(
        &api_config,
        Arc::new(CircuitBreaker::default_api()),
    ));

    let provider = FallbackProvider::new(
        Box::new(PointsProvider::new(api)),
        Box::new(SnapshotProvider::new(&dir, Dataset::Points)),
    );

    let result = check_non_empty(|| provider.fetch());
    assert!(result.is_err());

    let _ = std::fs::remove_dir_all(&dir);
}
