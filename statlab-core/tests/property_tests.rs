//! Property tests for harness and cleaning invariants.
//!
//! Uses proptest to verify:
//! 1. Any table with at least one row passes the availability check
//! 2. An empty table always fails with the exact "empty result" reason
//! 3. Cleaning never grows a table and respects the percent bounds

use polars::prelude::*;
use proptest::prelude::*;
use statlab_core::check::{check_non_empty, Outcome, EMPTY_RESULT};
use statlab_core::data::ingest::clean;
use statlab_core::data::{DataError, Dataset};

fn table_with(rows: usize) -> DataFrame {
    let ids: Vec<i64> = (0..rows as i64).collect();
    DataFrame::new(vec![Column::new("player_id".into(), ids)]).unwrap()
}

fn playing_table(chances: &[f64]) -> DataFrame {
    let n = chances.len();
    let ids: Vec<i64> = (0..n as i64).collect();
    let players: Vec<String> = (0..n).map(|i| format!("Player {i}")).collect();
    let teams: Vec<String> = vec!["ARS".to_string(); n];
    let statuses: Vec<String> = vec!["a".to_string(); n];

    df!(
        "player_id" => ids,
        "player" => players,
        "team" => teams,
        "status" => statuses,
        "chance_of_playing" => chances.to_vec(),
    )
    .unwrap()
}

proptest! {
    /// Row count ≥ 1 is the whole pass condition.
    #[test]
    fn any_table_with_rows_passes(rows in 1usize..300) {
        let outcome = check_non_empty(|| Ok::<_, DataError>(table_with(rows))).unwrap();
        prop_assert_eq!(outcome, Outcome::Pass);
    }

    /// Zero-row tables of any width fail with exactly "empty result".
    #[test]
    fn empty_tables_fail_with_the_exact_reason(cols in 1usize..6) {
        let columns: Vec<Column> = (0..cols)
            .map(|i| Column::new(format!("c{i}").into(), Vec::<i64>::new()))
            .collect();
        let empty = DataFrame::new(columns).unwrap();

        let outcome = check_non_empty(|| Ok::<_, DataError>(empty)).unwrap();
        prop_assert_eq!(outcome, Outcome::Fail { reason: EMPTY_RESULT.to_string() });
    }

    /// Cleaning only ever removes rows, and keeps chances inside 0..=100.
    #[test]
    fn cleaning_filters_playing_chances_into_bounds(
        chances in prop::collection::vec(-50.0..150.0f64, 1..40)
    ) {
        let df = playing_table(&chances);
        let cleaned = clean(Dataset::Playing, df.lazy()).collect().unwrap();

        prop_assert!(cleaned.height() <= chances.len());

        let kept = cleaned.column("chance_of_playing").unwrap().f64().unwrap();
        for chance in kept.into_iter().flatten() {
            prop_assert!((0.0..=100.0).contains(&chance));
        }

        let expected = chances.iter().filter(|c| (0.0..=100.0).contains(*c)).count();
        prop_assert_eq!(cleaned.height(), expected);
    }

    /// Cleaning an already-clean table changes nothing.
    #[test]
    fn cleaning_is_idempotent(
        chances in prop::collection::vec(0.0..=100.0f64, 1..40)
    ) {
        let df = playing_table(&chances);
        let once = clean(Dataset::Playing, df.lazy()).collect().unwrap();
        let twice = clean(Dataset::Playing, once.clone().lazy()).collect().unwrap();

        prop_assert!(once.equals(&twice));
    }
}
