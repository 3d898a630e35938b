//! StatLab Core — fantasy-football tables and the availability harness.
//!
//! This crate contains:
//! - Dataset definitions and column schemas (points, playing, forecast)
//! - The DataProvider contract and the stats API client
//! - Parquet snapshot cache with integrity validation
//! - CSV import and table cleaning
//! - The non-empty verification harness (`check`)

pub mod check;
pub mod config;
pub mod data;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: provider types are Send + Sync.
    ///
    /// Providers are meant to be shareable across a future worker thread;
    /// this breaks the build immediately if that stops holding.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<data::StatsApi>();
        require_sync::<data::StatsApi>();
        require_send::<data::PointsProvider>();
        require_sync::<data::PointsProvider>();
        require_send::<data::PlayingProvider>();
        require_sync::<data::PlayingProvider>();
        require_send::<data::ForecastProvider>();
        require_sync::<data::ForecastProvider>();
        require_send::<data::SnapshotProvider>();
        require_sync::<data::SnapshotProvider>();
        require_send::<data::SampleProvider>();
        require_sync::<data::SampleProvider>();
        require_send::<data::CircuitBreaker>();
        require_sync::<data::CircuitBreaker>();
        require_send::<data::Dataset>();
        require_sync::<data::Dataset>();
        require_send::<check::Outcome>();
        require_sync::<check::Outcome>();
    }

    /// Architecture contract: the provider fetch takes no arguments.
    ///
    /// Providers are configured entirely at construction; if the trait ever
    /// grows fetch parameters, this stops compiling and the contract is
    /// visibly renegotiated.
    #[test]
    fn provider_fetch_is_zero_argument() {
        fn _check_trait_object_builds(
            provider: &dyn data::DataProvider,
        ) -> Result<polars::prelude::DataFrame, data::DataError> {
            provider.fetch()
        }
    }
}
