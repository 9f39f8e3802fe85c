//! Rulebench runner — configuration, batch orchestration, metrics, export.
//!
//! This crate builds on `rulebench-core` to provide:
//! - TOML run configuration with validation and a content-hash run id
//! - CSV bar loading and deterministic synthetic bars
//! - Single-strategy runs and parallel batches with failure isolation
//! - Performance metrics and fitness-based ranking
//! - JSON and CSV artifact export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod fitness;
pub mod metrics;
pub mod runner;

pub use config::{ConfigError, RunConfig, RunId, StrategySelection};
pub use data_loader::{
    dataset_hash, filter_range, generate_synthetic_bars, load_bars_csv, DataSource, LoadError,
};
pub use export::{
    export_equity_csv, export_json, export_ranking_csv, export_trades_csv, import_json,
    load_artifacts, save_artifacts,
};
pub use fitness::FitnessMetric;
pub use metrics::PerformanceMetrics;
pub use runner::{
    rank, run_batch, run_strategy, BacktestResult, BatchReport, RunError, RunFailure,
    SCHEMA_VERSION,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn results_are_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
        assert_send::<BatchReport>();
        assert_sync::<BatchReport>();
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
    }

    #[test]
    fn config_is_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<FitnessMetric>();
        assert_sync::<FitnessMetric>();
    }
}
