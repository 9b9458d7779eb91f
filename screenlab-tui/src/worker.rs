//! Background worker thread: screening runs happen here.
//!
//! Communication with the TUI main thread is via `mpsc` channels. The worker
//! owns the price cache and forecast engine, so both persist across runs.

use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use screenlab_core::data::{DataSource, PriceCache};
use screenlab_core::domain::{RunParams, StatusCounts, TickerUniverse};
use screenlab_core::forecast::ForecastEngine;
use screenlab_runner::{run_batch, BatchOptions, BatchProgress, RowOrder, ScreenerTable};

/// Commands sent from the TUI to the worker.
#[derive(Debug)]
pub enum WorkerCommand {
    RunScreen { params: RunParams, order: RowOrder },
    Shutdown,
}

/// Summary of a finished run, shown in the screener header.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub params: RunParams,
    pub counts: StatusCounts,
    pub source: DataSource,
    /// When the prices behind the run were downloaded.
    pub fetched_at: DateTime<Utc>,
    pub model: String,
    pub elapsed: Duration,
}

/// Responses sent from the worker back to the TUI.
#[derive(Debug)]
pub enum WorkerResponse {
    Progress(BatchProgress),
    ScreenDone {
        table: ScreenerTable,
        summary: RunSummary,
    },
    ScreenError {
        error: String,
    },
}

/// Everything a run needs, moved onto the worker thread.
pub struct WorkerContext {
    pub universe: TickerUniverse,
    pub cache: PriceCache,
    pub engine: ForecastEngine,
    pub options: BatchOptions,
}

/// Spawn the background worker thread.
pub fn spawn_worker(
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    ctx: WorkerContext,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("screenlab-worker".into())
        .spawn(move || worker_loop(rx, tx, ctx))
}

fn worker_loop(rx: Receiver<WorkerCommand>, tx: Sender<WorkerResponse>, ctx: WorkerContext) {
    loop {
        match rx.recv() {
            Ok(WorkerCommand::Shutdown) | Err(_) => break,
            Ok(WorkerCommand::RunScreen { params, order }) => {
                handle_run(params, order, &ctx, &tx);
            }
        }
    }
}

fn handle_run(params: RunParams, order: RowOrder, ctx: &WorkerContext, tx: &Sender<WorkerResponse>) {
    ctx.cache.purge_expired();
    ctx.engine.purge_expired();

    let tx_clone = tx.clone();
    let progress_cb = move |progress: &BatchProgress| {
        let _ = tx_clone.send(WorkerResponse::Progress(progress.clone()));
    };

    match run_batch(
        ctx.universe.tickers(),
        params,
        &ctx.cache,
        &ctx.engine,
        &ctx.options,
        Some(&progress_cb),
    ) {
        Ok(outcome) => {
            let summary = RunSummary {
                params: outcome.params,
                counts: outcome.counts,
                source: outcome.source,
                fetched_at: outcome.fetched_at,
                model: outcome.model,
                elapsed: outcome.elapsed,
            };
            let table = ScreenerTable::assemble(outcome.rows, order);
            let _ = tx.send(WorkerResponse::ScreenDone { table, summary });
        }
        Err(e) => {
            let _ = tx.send(WorkerResponse::ScreenError {
                error: e.to_string(),
            });
        }
    }
}
