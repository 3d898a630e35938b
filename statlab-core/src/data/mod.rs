//! Dataset acquisition, validation, and caching.

pub mod api;
pub mod cache;
pub mod circuit_breaker;
pub mod ingest;
pub mod provider;
pub mod refresh;
pub mod sample;
pub mod schema;

pub use api::{ForecastProvider, PlayingProvider, PointsProvider, StatsApi};
pub use cache::{CacheStatus, SnapshotCache, SnapshotMeta, SnapshotProvider};
pub use circuit_breaker::CircuitBreaker;
pub use ingest::TableImporter;
pub use provider::{
    DataError, DataProvider, DataSource, Dataset, FallbackProvider, FetchProgress, StdoutProgress,
};
pub use refresh::{refresh_datasets, RefreshSummary};
pub use sample::SampleProvider;
pub use schema::TableSchema;
