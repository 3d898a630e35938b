//! Deterministic sample tables for development and offline demos.
//!
//! Produces plausible fantasy-football tables seeded from the dataset name,
//! so repeated runs see identical data. Sample tables are tagged as
//! synthetic and never written to the snapshot cache.

use super::provider::{DataError, DataProvider, Dataset};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TEAMS: [&str; 8] = ["ARS", "MCI", "LIV", "CHE", "TOT", "MUN", "NEW", "AVL"];
const PLAYERS_PER_TEAM: usize = 5;
const FINISHED_ROUNDS: i64 = 3;

fn seeded_rng(dataset: Dataset) -> StdRng {
    let seed_bytes = blake3::hash(dataset.name().as_bytes());
    StdRng::from_seed(*seed_bytes.as_bytes())
}

fn roster() -> Vec<(i64, String, &'static str)> {
    let mut players = Vec::with_capacity(TEAMS.len() * PLAYERS_PER_TEAM);
    let mut id = 100i64;
    for team in TEAMS {
        for _ in 0..PLAYERS_PER_TEAM {
            id += 1;
            players.push((id, format!("Player {id}"), team));
        }
    }
    players
}

/// Generate the sample table for a dataset.
pub fn sample_table(dataset: Dataset) -> DataFrame {
    let mut rng = seeded_rng(dataset);
    let roster = roster();

    match dataset {
        Dataset::Points => {
            let mut player_ids = Vec::new();
            let mut players = Vec::new();
            let mut teams = Vec::new();
            let mut rounds = Vec::new();
            let mut minutes = Vec::new();
            let mut points = Vec::new();

            for round in 1..=FINISHED_ROUNDS {
                for (id, name, team) in &roster {
                    let mins: i64 = if rng.gen_bool(0.85) {
                        rng.gen_range(45..=90)
                    } else {
                        0
                    };
                    let pts: i64 = if mins == 0 {
                        0
                    } else {
                        rng.gen_range(-1..=15)
                    };
                    player_ids.push(*id);
                    players.push(name.clone());
                    teams.push((*team).to_string());
                    rounds.push(round);
                    minutes.push(mins);
                    points.push(pts);
                }
            }

            df!(
                "player_id" => player_ids,
                "player" => players,
                "team" => teams,
                "round" => rounds,
                "minutes" => minutes,
                "points" => points,
            )
            .expect("sample points table")
        }
        Dataset::Playing => {
            let mut player_ids = Vec::new();
            let mut players = Vec::new();
            let mut teams = Vec::new();
            let mut statuses = Vec::new();
            let mut chances = Vec::new();

            for (id, name, team) in &roster {
                let (status, chance) = if rng.gen_bool(0.8) {
                    ("a", 100.0)
                } else if rng.gen_bool(0.7) {
                    ("d", [25.0, 50.0, 75.0][rng.gen_range(0..3)])
                } else {
                    ("i", 0.0)
                };
                player_ids.push(*id);
                players.push(name.clone());
                teams.push((*team).to_string());
                statuses.push(status.to_string());
                chances.push(chance);
            }

            df!(
                "player_id" => player_ids,
                "player" => players,
                "team" => teams,
                "status" => statuses,
                "chance_of_playing" => chances,
            )
            .expect("sample playing table")
        }
        Dataset::Forecast => {
            let next_round = FINISHED_ROUNDS + 1;
            let mut player_ids = Vec::new();
            let mut players = Vec::new();
            let mut rounds = Vec::new();
            let mut predicted = Vec::new();

            for (id, name, _) in &roster {
                player_ids.push(*id);
                players.push(name.clone());
                rounds.push(next_round);
                predicted.push((rng.gen_range(0.0..12.0_f64) * 10.0).round() / 10.0);
            }

            df!(
                "player_id" => player_ids,
                "player" => players,
                "round" => rounds,
                "predicted_points" => predicted,
            )
            .expect("sample forecast table")
        }
    }
}

/// Provider serving the deterministic sample table for a dataset.
pub struct SampleProvider {
    dataset: Dataset,
    name: String,
}

impl SampleProvider {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            name: format!("sample/{dataset}"),
        }
    }
}

impl DataProvider for SampleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn dataset(&self) -> Dataset {
        self.dataset
    }

    fn fetch(&self) -> Result<DataFrame, DataError> {
        Ok(sample_table(self.dataset))
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::TableSchema;

    #[test]
    fn sample_tables_are_non_empty_and_schema_valid() {
        for ds in Dataset::ALL {
            let df = sample_table(ds);
            assert!(df.height() > 0, "{ds} sample is empty");
            TableSchema::validate(ds, &df).unwrap();
        }
    }

    #[test]
    fn sample_tables_are_deterministic() {
        for ds in Dataset::ALL {
            assert!(sample_table(ds).equals(&sample_table(ds)));
        }
    }

    #[test]
    fn playing_chances_stay_in_percent_range() {
        let df = sample_table(Dataset::Playing);
        let chances = df.column("chance_of_playing").unwrap().f64().unwrap();
        for chance in chances.into_iter().flatten() {
            assert!((0.0..=100.0).contains(&chance));
        }
    }

    #[test]
    fn points_rows_cover_all_finished_rounds() {
        let df = sample_table(Dataset::Points);
        let rounds = df.column("round").unwrap().i64().unwrap();
        let max_round = rounds.into_iter().flatten().max().unwrap();
        assert_eq!(max_round, FINISHED_ROUNDS);
        assert_eq!(
            df.height(),
            TEAMS.len() * PLAYERS_PER_TEAM * FINISHED_ROUNDS as usize
        );
    }
}
