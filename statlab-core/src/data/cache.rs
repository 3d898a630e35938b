//! Parquet snapshot cache.
//!
//! Layout: `{cache_dir}/dataset={name}/{as_of}.parquet`
//!
//! Features:
//! - Atomic writes (write to .tmp, rename into place)
//! - One snapshot per dataset per as-of date; loads pick the newest
//! - Integrity validation on load (required columns, row count > 0)
//! - Quarantine for corrupt files ({filename}.quarantined)
//! - Metadata sidecar per dataset (hash, as-of date, source)

use super::provider::{DataError, DataProvider, Dataset};
use super::schema::TableSchema;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata sidecar for a dataset's most recent snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub dataset: Dataset,
    pub as_of: NaiveDate,
    pub row_count: usize,
    pub data_hash: String,
    pub source: String,
    pub cached_at: chrono::NaiveDateTime,
}

/// A snapshot file on disk.
#[derive(Debug, Clone)]
pub struct SnapshotInfo {
    pub as_of: NaiveDate,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// The parquet snapshot cache.
pub struct SnapshotCache {
    cache_dir: PathBuf,
}

impl SnapshotCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Root directory of the cache.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Directory for a dataset: `{cache_dir}/dataset={name}/`
    fn dataset_dir(&self, dataset: Dataset) -> PathBuf {
        self.cache_dir.join(format!("dataset={}", dataset.name()))
    }

    /// Path to the snapshot for a dataset + as-of date.
    fn snapshot_path(&self, dataset: Dataset, as_of: NaiveDate) -> PathBuf {
        self.dataset_dir(dataset).join(format!("{as_of}.parquet"))
    }

    /// Path to the metadata sidecar for a dataset.
    fn meta_path(&self, dataset: Dataset) -> PathBuf {
        self.dataset_dir(dataset).join("meta.json")
    }

    /// Write a snapshot for a dataset.
    ///
    /// Writes are atomic: write to .tmp then rename. An empty table is
    /// refused — a snapshot that says "no data" is indistinguishable from a
    /// broken fetch, and the harness must see emptiness live, not cached.
    pub fn write(
        &self,
        dataset: Dataset,
        df: &DataFrame,
        as_of: NaiveDate,
        source: &str,
    ) -> Result<(), DataError> {
        if df.height() == 0 {
            return Err(DataError::CacheError(format!(
                "refusing to cache an empty {dataset} table"
            )));
        }

        let ds_dir = self.dataset_dir(dataset);
        fs::create_dir_all(&ds_dir)
            .map_err(|e| DataError::CacheError(format!("failed to create dir: {e}")))?;

        let path = self.snapshot_path(dataset, as_of);
        let tmp_path = path.with_extension("parquet.tmp");

        write_parquet(df, &tmp_path)?;

        let data_hash = blake3::hash(
            &fs::read(&tmp_path).map_err(|e| DataError::CacheError(format!("hash read: {e}")))?,
        )
        .to_hex()
        .to_string();

        // Atomic rename
        fs::rename(&tmp_path, &path).map_err(|e| {
            // Clean up temp file on rename failure
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheError(format!("atomic rename failed: {e}"))
        })?;

        let meta = SnapshotMeta {
            dataset,
            as_of,
            row_count: df.height(),
            data_hash,
            source: source.to_string(),
            cached_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::CacheError(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(dataset), meta_json)
            .map_err(|e| DataError::CacheError(format!("meta write: {e}")))?;

        Ok(())
    }

    /// Load the newest intact snapshot for a dataset.
    ///
    /// Corrupt snapshots are quarantined and the next older one is tried.
    pub fn load_latest(&self, dataset: Dataset) -> Result<DataFrame, DataError> {
        let mut snapshots = self.snapshots(dataset)?;
        snapshots.sort_by_key(|s| s.as_of);

        for snap in snapshots.iter().rev() {
            match load_and_validate_parquet(dataset, &snap.path) {
                Ok(df) => return Ok(df),
                Err(e) => {
                    let quarantine = snap.path.with_extension("parquet.quarantined");
                    eprintln!(
                        "WARNING: quarantining corrupt snapshot {}: {e}",
                        snap.path.display()
                    );
                    let _ = fs::rename(&snap.path, &quarantine);
                }
            }
        }

        Err(DataError::NoCachedSnapshot { dataset })
    }

    /// List the snapshot files present for a dataset, unordered.
    pub fn snapshots(&self, dataset: Dataset) -> Result<Vec<SnapshotInfo>, DataError> {
        let ds_dir = self.dataset_dir(dataset);
        if !ds_dir.exists() {
            return Err(DataError::NoCachedSnapshot { dataset });
        }

        let entries =
            fs::read_dir(&ds_dir).map_err(|e| DataError::CacheError(format!("read dir: {e}")))?;

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DataError::CacheError(format!("dir entry: {e}")))?;
            let path = entry.path();

            // Skip non-parquet files (meta.json, .quarantined, etc)
            if path.extension().and_then(|e| e.to_str()) != Some("parquet") {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Ok(as_of) = NaiveDate::parse_from_str(stem, "%Y-%m-%d") else {
                continue;
            };

            let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
            found.push(SnapshotInfo {
                as_of,
                path,
                size_bytes,
            });
        }

        if found.is_empty() {
            return Err(DataError::NoCachedSnapshot { dataset });
        }

        Ok(found)
    }

    /// Read the metadata sidecar for a dataset, if present.
    pub fn get_meta(&self, dataset: Dataset) -> Option<SnapshotMeta> {
        let content = fs::read_to_string(self.meta_path(dataset)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Whether the newest snapshot is within `max_age_days` of `today`.
    pub fn is_fresh(&self, dataset: Dataset, max_age_days: u32, today: NaiveDate) -> bool {
        match self.get_meta(dataset) {
            None => false,
            Some(meta) => (today - meta.as_of).num_days() <= i64::from(max_age_days),
        }
    }

    /// Cache state for every dataset.
    pub fn status(&self) -> Vec<CacheStatus> {
        Dataset::ALL
            .iter()
            .map(|&dataset| {
                let meta = self.get_meta(dataset);
                CacheStatus {
                    dataset,
                    cached: meta.is_some(),
                    as_of: meta.as_ref().map(|m| m.as_of),
                    row_count: meta.as_ref().map(|m| m.row_count),
                    source: meta.map(|m| m.source),
                }
            })
            .collect()
    }
}

/// Cache state for a single dataset.
#[derive(Debug, Clone)]
pub struct CacheStatus {
    pub dataset: Dataset,
    pub cached: bool,
    pub as_of: Option<NaiveDate>,
    pub row_count: Option<usize>,
    pub source: Option<String>,
}

/// Provider backed by the snapshot cache — serves the newest intact snapshot.
///
/// This is what `check --offline` runs against: the same provider contract,
/// no network.
pub struct SnapshotProvider {
    cache: SnapshotCache,
    dataset: Dataset,
    name: String,
}

impl SnapshotProvider {
    pub fn new(cache_dir: impl Into<PathBuf>, dataset: Dataset) -> Self {
        Self {
            cache: SnapshotCache::new(cache_dir),
            dataset,
            name: format!("snapshot_cache/{dataset}"),
        }
    }
}

impl DataProvider for SnapshotProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn dataset(&self) -> Dataset {
        self.dataset
    }

    fn fetch(&self) -> Result<DataFrame, DataError> {
        self.cache.load_latest(self.dataset)
    }

    fn is_available(&self) -> bool {
        self.cache.get_meta(self.dataset).is_some()
    }
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn write_parquet(df: &DataFrame, path: &Path) -> Result<(), DataError> {
    let file =
        fs::File::create(path).map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(&mut df.clone())
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    Ok(())
}

/// Load a parquet snapshot and validate its integrity.
fn load_and_validate_parquet(dataset: Dataset, path: &Path) -> Result<DataFrame, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::ParquetError(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;

    // A stored snapshot must have rows — empty tables are never cached
    if df.height() == 0 {
        return Err(DataError::ValidationError("empty parquet snapshot".into()));
    }

    for col_name in TableSchema::required_columns(dataset) {
        if df.column(col_name).is_err() {
            return Err(DataError::ValidationError(format!(
                "missing column '{col_name}'"
            )));
        }
    }

    Ok(df)
}
