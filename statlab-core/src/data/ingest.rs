//! CSV import and table cleaning.
//!
//! The import path reads a CSV with the dataset's schema, runs it through
//! the cleaning pipeline, and validates the result. Cleaning also runs on
//! freshly fetched tables before they are cached.

use super::provider::{DataError, Dataset};
use super::schema::TableSchema;
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;

/// Stable sort keys and identity columns per dataset.
fn identity_columns(dataset: Dataset) -> Vec<PlSmallStr> {
    match dataset {
        Dataset::Points | Dataset::Forecast => vec!["player_id".into(), "round".into()],
        Dataset::Playing => vec!["player_id".into()],
    }
}

fn sort_keys(dataset: Dataset) -> &'static [&'static str] {
    match dataset {
        Dataset::Points | Dataset::Forecast => &["round", "player_id"],
        Dataset::Playing => &["player_id"],
    }
}

/// Canonicalize a table: sort by stable keys, dedupe on identity columns,
/// drop rows that violate dataset bounds.
///
/// Points may legitimately be negative (cards, own goals); minutes may not.
pub fn clean(dataset: Dataset, lf: LazyFrame) -> LazyFrame {
    let keys = sort_keys(dataset);
    let descending = vec![false; keys.len()];

    let canonical = lf
        .sort(
            keys,
            SortMultipleOptions::default()
                .with_order_descending_multi(descending)
                .with_maintain_order(true),
        )
        .unique_stable(Some(identity_columns(dataset)), UniqueKeepStrategy::First);

    match dataset {
        Dataset::Points => canonical.filter(col("minutes").gt_eq(0).and(col("round").gt_eq(1))),
        Dataset::Playing => canonical.filter(
            col("chance_of_playing")
                .gt_eq(0.0)
                .and(col("chance_of_playing").lt_eq(100.0)),
        ),
        Dataset::Forecast => {
            canonical.filter(col("predicted_points").gt_eq(0.0).and(col("round").gt_eq(1)))
        }
    }
}

/// CSV importer for local dataset files.
pub struct TableImporter;

impl TableImporter {
    /// Import a dataset from a CSV file: read with the dataset schema,
    /// clean, and validate.
    pub fn import_csv(dataset: Dataset, path: &Path) -> Result<DataFrame, DataError> {
        let schema = TableSchema::schema(dataset);
        let lf = LazyCsvReader::new(path)
            .with_schema(Some(Arc::new(schema)))
            .with_has_header(true)
            .finish()
            .map_err(|e| DataError::ImportFailed(e.to_string()))?;

        let df = clean(dataset, lf)
            .collect()
            .map_err(|e| DataError::ImportFailed(e.to_string()))?;

        TableSchema::validate(dataset, &df)
            .map_err(|e| DataError::ValidationError(e.to_string()))?;

        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_dir() -> std::path::PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "statlab_ingest_test_{}_{id}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn clean_dedupes_on_identity_columns() {
        let df = df!(
            "player_id" => &[101i64, 101, 102],
            "player" => &["Saka", "Saka", "Haaland"],
            "team" => &["ARS", "ARS", "MCI"],
            "round" => &[1i64, 1, 1],
            "minutes" => &[90i64, 90, 84],
            "points" => &[9i64, 11, 13],
        )
        .unwrap();

        let cleaned = clean(Dataset::Points, df.lazy()).collect().unwrap();

        assert_eq!(cleaned.height(), 2);
        // First occurrence is kept
        let pts = cleaned.column("points").unwrap().i64().unwrap();
        assert_eq!(pts.get(0), Some(9));
    }

    #[test]
    fn clean_sorts_points_by_round_then_player() {
        let df = df!(
            "player_id" => &[102i64, 101, 101],
            "player" => &["Haaland", "Saka", "Saka"],
            "team" => &["MCI", "ARS", "ARS"],
            "round" => &[2i64, 1, 2],
            "minutes" => &[84i64, 90, 88],
            "points" => &[13i64, 9, 2],
        )
        .unwrap();

        let cleaned = clean(Dataset::Points, df.lazy()).collect().unwrap();
        let rounds = cleaned.column("round").unwrap().i64().unwrap();
        let ids = cleaned.column("player_id").unwrap().i64().unwrap();

        assert_eq!(rounds.get(0), Some(1));
        assert_eq!((rounds.get(2), ids.get(2)), (Some(2), Some(102)));
    }

    #[test]
    fn clean_keeps_negative_points_but_drops_negative_minutes() {
        let df = df!(
            "player_id" => &[101i64, 102],
            "player" => &["Saka", "Haaland"],
            "team" => &["ARS", "MCI"],
            "round" => &[1i64, 1],
            "minutes" => &[90i64, -5],
            "points" => &[-2i64, 13],
        )
        .unwrap();

        let cleaned = clean(Dataset::Points, df.lazy()).collect().unwrap();

        assert_eq!(cleaned.height(), 1);
        let pts = cleaned.column("points").unwrap().i64().unwrap();
        assert_eq!(pts.get(0), Some(-2));
    }

    #[test]
    fn clean_drops_out_of_range_chance() {
        let df = df!(
            "player_id" => &[101i64, 102, 103],
            "player" => &["Saka", "Haaland", "Palmer"],
            "team" => &["ARS", "MCI", "CHE"],
            "status" => &["a", "d", "d"],
            "chance_of_playing" => &[100.0, 150.0, -25.0],
        )
        .unwrap();

        let cleaned = clean(Dataset::Playing, df.lazy()).collect().unwrap();

        assert_eq!(cleaned.height(), 1);
    }

    #[test]
    fn import_csv_end_to_end() {
        let dir = temp_dir();
        let path = dir.join("forecast.csv");
        std::fs::write(
            &path,
            "player_id,player,round,predicted_points\n\
             101,Saka,4,6.5\n\
             102,Haaland,4,9.1\n\
             102,Haaland,4,9.1\n",
        )
        .unwrap();

        let df = TableImporter::import_csv(Dataset::Forecast, &path).unwrap();

        // Duplicate row removed
        assert_eq!(df.height(), 2);
        TableSchema::validate(Dataset::Forecast, &df).unwrap();

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn import_missing_file_fails() {
        let dir = temp_dir();
        let result = TableImporter::import_csv(Dataset::Points, &dir.join("absent.csv"));
        assert!(matches!(result, Err(DataError::ImportFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
