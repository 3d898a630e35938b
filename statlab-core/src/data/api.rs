//! Fantasy stats API client.
//!
//! Fetches the points, playing-status, and forecast tables from the stats
//! API as JSON and converts them to DataFrames. Handles rate limiting,
//! retries with exponential backoff, response parsing, and the circuit
//! breaker.
//!
//! The API is unauthenticated and subject to unannounced format changes.
//! The CSV import path is the primary fallback when it is unavailable.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataProvider, Dataset};
use crate::config::ApiConfig;
use polars::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Envelope shared by all three endpoints.
#[derive(Debug, Deserialize)]
struct TableResponse<R> {
    rows: Vec<R>,
}

#[derive(Debug, Deserialize)]
struct PointsRow {
    player_id: i64,
    player: String,
    team: String,
    round: i64,
    minutes: i64,
    points: i64,
}

#[derive(Debug, Deserialize)]
struct PlayingRow {
    player_id: i64,
    player: String,
    team: String,
    status: String,
    /// Absent for players without a fitness flag, meaning fully fit.
    chance_of_playing: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ForecastRow {
    player_id: i64,
    player: String,
    round: i64,
    predicted_points: f64,
}

/// Blocking HTTP client for the stats API.
pub struct StatsApi {
    client: reqwest::blocking::Client,
    base_url: String,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl StatsApi {
    pub fn new(base_url: impl Into<String>, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        Self::with_timeout(base_url, circuit_breaker, Duration::from_secs(30), 3)
    }

    /// Build a client from the `[api]` config section.
    pub fn from_config(config: &ApiConfig, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        Self::with_timeout(
            config.base_url.clone(),
            circuit_breaker,
            Duration::from_secs(config.timeout_secs),
            config.max_retries,
        )
    }

    fn with_timeout(
        base_url: impl Into<String>,
        circuit_breaker: Arc<CircuitBreaker>,
        timeout: Duration,
        max_retries: u32,
    ) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("statlab/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            circuit_breaker,
            max_retries,
            base_delay: Duration::from_millis(500),
        }
    }

    /// Whether the circuit breaker currently admits requests.
    pub fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }

    /// Endpoint URL for a dataset.
    fn table_url(&self, dataset: Dataset) -> String {
        let path = match dataset {
            Dataset::Points => "api/points",
            Dataset::Playing => "api/playing-status",
            Dataset::Forecast => "api/forecast",
        };
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }

    /// Fetch one table, with retry and circuit breaker logic.
    pub fn fetch_table(&self, dataset: Dataset) -> Result<DataFrame, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let url = self.table_url(dataset);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
                        // Request block — immediately trip the circuit breaker
                        self.circuit_breaker.trip();
                        return Err(DataError::CircuitBreakerTripped);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        self.circuit_breaker.record_failure();
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::DatasetUnavailable { dataset });
                    }

                    if !status.is_success() {
                        self.circuit_breaker.record_failure();
                        last_error =
                            Some(DataError::Other(format!("HTTP {status} for {dataset}")));
                        continue;
                    }

                    let body = resp.text().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to read response for {dataset}: {e}"
                        ))
                    })?;

                    let df = parse_table(dataset, &body)?;
                    self.circuit_breaker.record_success();
                    return Ok(df);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

/// Parse an endpoint response body into a DataFrame.
///
/// A response with zero rows is still a well-formed response — it parses to
/// an empty table. Whether empty is acceptable is the availability harness's
/// call, not the client's.
fn parse_table(dataset: Dataset, body: &str) -> Result<DataFrame, DataError> {
    let format_err = |e: serde_json::Error| {
        DataError::ResponseFormatChanged(format!("{dataset} response: {e}"))
    };

    match dataset {
        Dataset::Points => {
            let resp: TableResponse<PointsRow> = serde_json::from_str(body).map_err(format_err)?;
            points_to_dataframe(resp.rows)
        }
        Dataset::Playing => {
            let resp: TableResponse<PlayingRow> = serde_json::from_str(body).map_err(format_err)?;
            playing_to_dataframe(resp.rows)
        }
        Dataset::Forecast => {
            let resp: TableResponse<ForecastRow> =
                serde_json::from_str(body).map_err(format_err)?;
            forecast_to_dataframe(resp.rows)
        }
    }
}

fn points_to_dataframe(rows: Vec<PointsRow>) -> Result<DataFrame, DataError> {
    let mut player_ids = Vec::with_capacity(rows.len());
    let mut players = Vec::with_capacity(rows.len());
    let mut teams = Vec::with_capacity(rows.len());
    let mut rounds = Vec::with_capacity(rows.len());
    let mut minutes = Vec::with_capacity(rows.len());
    let mut points = Vec::with_capacity(rows.len());

    for row in rows {
        player_ids.push(row.player_id);
        players.push(row.player);
        teams.push(row.team);
        rounds.push(row.round);
        minutes.push(row.minutes);
        points.push(row.points);
    }

    DataFrame::new(vec![
        Column::new("player_id".into(), player_ids),
        Column::new("player".into(), players),
        Column::new("team".into(), teams),
        Column::new("round".into(), rounds),
        Column::new("minutes".into(), minutes),
        Column::new("points".into(), points),
    ])
    .map_err(|e| DataError::Other(format!("points dataframe: {e}")))
}

fn playing_to_dataframe(rows: Vec<PlayingRow>) -> Result<DataFrame, DataError> {
    let mut player_ids = Vec::with_capacity(rows.len());
    let mut players = Vec::with_capacity(rows.len());
    let mut teams = Vec::with_capacity(rows.len());
    let mut statuses = Vec::with_capacity(rows.len());
    let mut chances = Vec::with_capacity(rows.len());

    for row in rows {
        player_ids.push(row.player_id);
        players.push(row.player);
        teams.push(row.team);
        statuses.push(row.status);
        // No flag means fully fit
        chances.push(row.chance_of_playing.unwrap_or(100.0));
    }

    DataFrame::new(vec![
        Column::new("player_id".into(), player_ids),
        Column::new("player".into(), players),
        Column::new("team".into(), teams),
        Column::new("status".into(), statuses),
        Column::new("chance_of_playing".into(), chances),
    ])
    .map_err(|e| DataError::Other(format!("playing dataframe: {e}")))
}

fn forecast_to_dataframe(rows: Vec<ForecastRow>) -> Result<DataFrame, DataError> {
    let mut player_ids = Vec::with_capacity(rows.len());
    let mut players = Vec::with_capacity(rows.len());
    let mut rounds = Vec::with_capacity(rows.len());
    let mut predicted = Vec::with_capacity(rows.len());

    for row in rows {
        player_ids.push(row.player_id);
        players.push(row.player);
        rounds.push(row.round);
        predicted.push(row.predicted_points);
    }

    DataFrame::new(vec![
        Column::new("player_id".into(), player_ids),
        Column::new("player".into(), players),
        Column::new("round".into(), rounds),
        Column::new("predicted_points".into(), predicted),
    ])
    .map_err(|e| DataError::Other(format!("forecast dataframe: {e}")))
}

/// Points table from the stats API.
pub struct PointsProvider {
    api: Arc<StatsApi>,
}

impl PointsProvider {
    pub fn new(api: Arc<StatsApi>) -> Self {
        Self { api }
    }
}

impl DataProvider for PointsProvider {
    fn name(&self) -> &str {
        "stats_api/points"
    }

    fn dataset(&self) -> Dataset {
        Dataset::Points
    }

    fn fetch(&self) -> Result<DataFrame, DataError> {
        self.api.fetch_table(Dataset::Points)
    }

    fn is_available(&self) -> bool {
        self.api.is_available()
    }
}

/// Playing-status table from the stats API.
pub struct PlayingProvider {
    api: Arc<StatsApi>,
}

impl PlayingProvider {
    pub fn new(api: Arc<StatsApi>) -> Self {
        Self { api }
    }
}

impl DataProvider for PlayingProvider {
    fn name(&self) -> &str {
        "stats_api/playing"
    }

    fn dataset(&self) -> Dataset {
        Dataset::Playing
    }

    fn fetch(&self) -> Result<DataFrame, DataError> {
        self.api.fetch_table(Dataset::Playing)
    }

    fn is_available(&self) -> bool {
        self.api.is_available()
    }
}

/// Forecast table from the stats API.
pub struct ForecastProvider {
    api: Arc<StatsApi>,
}

impl ForecastProvider {
    pub fn new(api: Arc<StatsApi>) -> Self {
        Self { api }
    }
}

impl DataProvider for ForecastProvider {
    fn name(&self) -> &str {
        "stats_api/forecast"
    }

    fn dataset(&self) -> Dataset {
        Dataset::Forecast
    }

    fn fetch(&self) -> Result<DataFrame, DataError> {
        self.api.fetch_table(Dataset::Forecast)
    }

    fn is_available(&self) -> bool {
        self.api.is_available()
    }
}
