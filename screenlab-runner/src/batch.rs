//! Batch orchestrator: one bulk fetch, then one row task per ticker on a
//! private worker pool, with results streamed back as they complete.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use screenlab_core::data::{DataSource, PriceCache};
use screenlab_core::domain::{Lookback, RowStatus, RunParams, ScreenerRow, StatusCounts, Ticker};
use screenlab_core::forecast::ForecastEngine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::row::compute_row;

/// Worker count used when nothing else is configured.
pub const DEFAULT_WORKERS: usize = 6;

/// Name prefix of the row worker threads. Panics on these threads are
/// contained and become ARIMA_ERROR rows.
pub const WORKER_THREAD_PREFIX: &str = "screen-worker-";

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("ticker universe is empty")]
    EmptyUniverse,

    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub workers: usize,
    pub lookback: Lookback,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            lookback: Lookback::FIVE_YEARS_DAILY,
        }
    }
}

/// A finished row tagged with its sort keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedRow {
    /// Position of the ticker in the universe.
    pub index: usize,
    /// Order in which the row completed (0-based).
    pub sequence: usize,
    pub row: ScreenerRow,
}

/// Progress snapshot handed to the callback after each completion.
#[derive(Debug, Clone)]
pub struct BatchProgress {
    pub row: ScreenerRow,
    pub completed: usize,
    pub total: usize,
}

impl BatchProgress {
    /// Completed fraction in [0, 1].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub params: RunParams,
    /// Rows in completion order.
    pub rows: Vec<CompletedRow>,
    pub counts: StatusCounts,
    pub source: DataSource,
    /// When the price payload was downloaded; older than `started_at` on a
    /// cache hit.
    pub fetched_at: DateTime<Utc>,
    /// Forecast model that produced the rows.
    pub model: String,
    pub started_at: DateTime<Utc>,
    pub fetch_elapsed: Duration,
    pub elapsed: Duration,
}

/// Run one screening batch over `tickers`.
///
/// Only configuration problems are errors; every per-ticker failure ends up
/// as a row status.
pub fn run_batch(
    tickers: &[Ticker],
    params: RunParams,
    cache: &PriceCache,
    engine: &ForecastEngine,
    options: &BatchOptions,
    progress: Option<&dyn Fn(&BatchProgress)>,
) -> Result<BatchOutcome, BatchError> {
    if tickers.is_empty() {
        return Err(BatchError::EmptyUniverse);
    }
    if options.workers == 0 {
        return Err(BatchError::NoWorkers);
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .thread_name(|i| format!("{WORKER_THREAD_PREFIX}{i}"))
        .build()?;

    let started_at = Utc::now();
    let start = Instant::now();
    let total = tickers.len();
    tracing::info!(
        tickers = total,
        window = %params.window,
        horizon = %params.horizon,
        workers = options.workers,
        provider = cache.provider_name(),
        "starting batch"
    );

    let symbols: Vec<String> = tickers.iter().map(|t| t.symbol.clone()).collect();
    let payload = cache.fetch(&symbols, options.lookback);
    let fetch_elapsed = start.elapsed();

    let mut rows: Vec<CompletedRow> = Vec::with_capacity(total);
    let mut counts = StatusCounts::default();

    pool.in_place_scope(|scope| {
        let (tx, rx) = mpsc::channel::<(usize, ScreenerRow)>();

        for (index, ticker) in tickers.iter().enumerate() {
            let tx = tx.clone();
            let payload = &payload;
            scope.spawn(move |_| {
                let row = catch_unwind(AssertUnwindSafe(|| {
                    compute_row(ticker, params, payload, engine)
                }))
                .unwrap_or_else(|panic| {
                    let reason = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".into());
                    tracing::error!(symbol = ticker.symbol.as_str(), %reason, "row task panicked");
                    ScreenerRow::empty(&ticker.name, &ticker.symbol, RowStatus::ArimaError)
                });
                // Receiver outlives every task in this scope
                let _ = tx.send((index, row));
            });
        }
        drop(tx);

        for (index, row) in rx {
            counts.record(row.status);
            let sequence = rows.len();
            rows.push(CompletedRow {
                index,
                sequence,
                row,
            });
            if let Some(cb) = progress {
                cb(&BatchProgress {
                    row: rows[sequence].row.clone(),
                    completed: sequence + 1,
                    total,
                });
            }
        }
    });

    let outcome = BatchOutcome {
        params,
        rows,
        counts,
        source: payload.source(),
        fetched_at: payload.fetched_at(),
        model: engine.model_name(),
        started_at,
        fetch_elapsed,
        elapsed: start.elapsed(),
    };
    tracing::info!(
        ok = counts.ok,
        no_data = counts.no_data,
        insufficient = counts.insufficient_data,
        arima_error = counts.arima_error,
        fits = engine.fit_count(),
        model = outcome.model.as_str(),
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "batch complete"
    );
    Ok(outcome)
}
