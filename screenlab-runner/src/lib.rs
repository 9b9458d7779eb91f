//! ScreenLab Runner: row computation, batch orchestration, aggregation.
//!
//! This crate builds on `screenlab-core` to provide:
//! - The Row Computer (extraction + statistics + forecast -> one status-coded row)
//! - The Batch Orchestrator (one cached fetch, a private worker pool, streamed progress)
//! - The Result Aggregator (stable ordering and presentation annotations)
//! - TOML run configuration and CSV/JSON export

pub mod aggregate;
pub mod batch;
pub mod config;
pub mod export;
pub mod row;

pub use aggregate::{DeltaTone, ForecastTone, RowAnnotations, RowOrder, ScreenerTable};
pub use batch::{
    run_batch, BatchError, BatchOptions, BatchOutcome, BatchProgress, CompletedRow,
    DEFAULT_WORKERS, WORKER_THREAD_PREFIX,
};
pub use config::{ConfigError, ScreenerConfig, DEFAULT_CONFIG_FILE};
pub use export::{export_csv, export_json, row_cells, write_csv, write_json, HEADERS};
pub use row::compute_row;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn outcome_types_are_send_sync() {
        assert_send::<BatchOutcome>();
        assert_sync::<BatchOutcome>();
        assert_send::<CompletedRow>();
        assert_sync::<CompletedRow>();
        assert_send::<ScreenerTable>();
        assert_sync::<ScreenerTable>();
    }

    #[test]
    fn progress_and_errors_are_send() {
        assert_send::<BatchProgress>();
        assert_send::<BatchError>();
        assert_send::<ConfigError>();
        assert_send::<ScreenerConfig>();
        assert_sync::<ScreenerConfig>();
    }
}
