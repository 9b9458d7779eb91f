//! Integration tests for the screening pipeline.
//!
//! Drives `run_batch` end to end with fixture providers and stub models.
//! Tests: every ticker reported once, one fetch per run, cache and memo
//! reuse across runs, failure isolation, status mapping, order independence.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use polars::prelude::*;
use proptest::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use screenlab_core::data::{
    bars_to_frame, DataError, DataSource, PriceCache, PricePayload, PriceProvider, RawBar,
    SyntheticProvider, DATE_COLUMN,
};
use screenlab_core::domain::{
    ForecastHorizon, HistoricalWindow, Lookback, RowStatus, RunParams, Ticker, TickerUniverse,
};
use screenlab_core::forecast::{
    ArimaOrder, Forecast, ForecastEngine, ForecastError, ForecastModel,
};
use screenlab_runner::{
    run_batch, BatchOptions, BatchProgress, CompletedRow, RowOrder, ScreenerTable,
};

// ── Fixtures ─────────────────────────────────────────────────────────

fn end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
}

fn frame_from_closes(closes: &[f64]) -> DataFrame {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let bars: Vec<RawBar> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| RawBar {
            date: start + chrono::Duration::days(i as i64),
            open: Some(c),
            high: Some(c),
            low: Some(c),
            close: Some(c),
            adj_close: Some(c),
            volume: Some(100),
        })
        .collect();
    bars_to_frame(&bars).unwrap()
}

/// Serves fixed frames and counts calls.
struct FixtureProvider {
    frames: HashMap<String, DataFrame>,
    calls: AtomicUsize,
    fail: bool,
}

impl FixtureProvider {
    fn new() -> Self {
        Self {
            frames: HashMap::new(),
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    fn with_closes(mut self, symbol: &str, closes: Vec<f64>) -> Self {
        self.frames
            .insert(symbol.to_string(), frame_from_closes(&closes));
        self
    }

    fn with_frame(mut self, symbol: &str, frame: DataFrame) -> Self {
        self.frames.insert(symbol.to_string(), frame);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PriceProvider for FixtureProvider {
    fn name(&self) -> &str {
        "fixture"
    }

    fn download(&self, symbols: &[String], _lookback: Lookback) -> Result<PricePayload, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DataError::ProviderUnavailable("fixture offline".into()));
        }
        let mut payload = PricePayload::new(DataSource::Synthetic);
        for s in symbols {
            if let Some(frame) = self.frames.get(s) {
                payload.insert(s.clone(), frame.clone());
            }
        }
        Ok(payload)
    }
}

/// Forecasts last + 10%, panicking on a sentinel last price.
struct StubModel {
    panic_on: Option<f64>,
    fail_on: Option<f64>,
}

impl StubModel {
    fn plain() -> Self {
        Self {
            panic_on: None,
            fail_on: None,
        }
    }
}

impl ForecastModel for StubModel {
    fn name(&self) -> String {
        "stub".into()
    }

    fn order(&self) -> ArimaOrder {
        ArimaOrder::SCREENING
    }

    fn forecast(&self, values: &[f64], _steps: usize) -> Result<Forecast, ForecastError> {
        let last = values[values.len() - 1];
        if Some(last) == self.panic_on {
            panic!("stub model exploded");
        }
        if Some(last) == self.fail_on {
            return Err(ForecastError::NotConverged { iterations: 1 });
        }
        Ok(Forecast {
            point: last * 1.1,
            lower: last,
            upper: last * 1.2,
            confidence: 0.95,
        })
    }
}

fn tickers(symbols: &[&str]) -> Vec<Ticker> {
    symbols
        .iter()
        .map(|s| Ticker::new(format!("{s} INC"), *s))
        .collect()
}

fn ramp(n: usize, start: f64) -> Vec<f64> {
    (0..n).map(|i| start + i as f64 * 0.5).collect()
}

fn params() -> RunParams {
    RunParams::new(HistoricalWindow::Days120, ForecastHorizon::Days30)
}

fn status_of(rows: &[CompletedRow], symbol: &str) -> RowStatus {
    rows.iter()
        .find(|r| r.row.symbol == symbol)
        .map(|r| r.row.status)
        .unwrap()
}

// ── Batch behavior ───────────────────────────────────────────────────

#[test]
fn every_ticker_reported_exactly_once() {
    let universe = TickerUniverse::default_universe();
    let provider = Arc::new(SyntheticProvider::new(end_date()));
    let cache = PriceCache::new(provider);
    let engine = ForecastEngine::new(Box::new(StubModel::plain()));

    let outcome = run_batch(
        universe.tickers(),
        params(),
        &cache,
        &engine,
        &BatchOptions::default(),
        None,
    )
    .unwrap();

    let mut indices: Vec<usize> = outcome.rows.iter().map(|r| r.index).collect();
    indices.sort_unstable();
    assert_eq!(indices, (0..universe.len()).collect::<Vec<_>>());
    let mut sequences: Vec<usize> = outcome.rows.iter().map(|r| r.sequence).collect();
    sequences.sort_unstable();
    assert_eq!(sequences, (0..universe.len()).collect::<Vec<_>>());
    assert_eq!(outcome.counts.ok, universe.len());
    assert_eq!(outcome.source, DataSource::Synthetic);
}

#[test]
fn second_run_reuses_payload_and_forecasts() {
    let provider = Arc::new(
        FixtureProvider::new()
            .with_closes("AAA", ramp(150, 10.0))
            .with_closes("BBB", ramp(150, 20.0)),
    );
    let cache = PriceCache::new(provider.clone());
    let engine = ForecastEngine::new(Box::new(StubModel::plain()));
    let universe = tickers(&["AAA", "BBB"]);

    let first = run_batch(&universe, params(), &cache, &engine, &BatchOptions::default(), None)
        .unwrap();
    let fits_after_first = engine.fit_count();
    let second = run_batch(&universe, params(), &cache, &engine, &BatchOptions::default(), None)
        .unwrap();

    assert_eq!(provider.calls(), 1);
    assert_eq!(fits_after_first, 2);
    assert_eq!(engine.fit_count(), 2);

    let a = ScreenerTable::assemble(first.rows, RowOrder::Declaration);
    let b = ScreenerTable::assemble(second.rows, RowOrder::Declaration);
    let rows_a: Vec<_> = a.rows().cloned().collect();
    let rows_b: Vec<_> = b.rows().cloned().collect();
    assert_eq!(rows_a, rows_b);
}

#[test]
fn changing_horizon_refits_but_does_not_refetch() {
    let provider = Arc::new(FixtureProvider::new().with_closes("AAA", ramp(150, 10.0)));
    let cache = PriceCache::new(provider.clone());
    let engine = ForecastEngine::new(Box::new(StubModel::plain()));
    let universe = tickers(&["AAA"]);

    for horizon in ForecastHorizon::ALL {
        let p = RunParams::new(HistoricalWindow::Days120, horizon);
        run_batch(&universe, p, &cache, &engine, &BatchOptions::default(), None).unwrap();
    }
    assert_eq!(provider.calls(), 1);
    assert_eq!(engine.fit_count(), 3);
}

#[test]
fn provider_failure_yields_all_no_data_and_is_retried_next_run() {
    let provider = Arc::new(FixtureProvider::failing());
    let cache = PriceCache::new(provider.clone());
    let engine = ForecastEngine::new(Box::new(StubModel::plain()));
    let universe = tickers(&["AAA", "BBB", "CCC"]);

    let outcome =
        run_batch(&universe, params(), &cache, &engine, &BatchOptions::default(), None).unwrap();
    assert_eq!(outcome.counts.no_data, 3);
    assert!(outcome.rows.iter().all(|r| r.row.is_blank()));
    assert_eq!(outcome.source, DataSource::Unavailable);

    run_batch(&universe, params(), &cache, &engine, &BatchOptions::default(), None).unwrap();
    assert_eq!(provider.calls(), 2);
}

#[test]
fn statuses_follow_precedence() {
    let no_close = DataFrame::new(vec![
        Column::new(DATE_COLUMN.into(), vec![1i32, 2, 3])
            .cast(&DataType::Date)
            .unwrap(),
        Column::new("Open".into(), vec![1.0, 2.0, 3.0]),
        Column::new("Volume".into(), vec![1.0, 2.0, 3.0]),
    ])
    .unwrap();
    let mut failing = ramp(60, 5.0);
    *failing.last_mut().unwrap() = 77.77;

    let provider = Arc::new(
        FixtureProvider::new()
            .with_closes("GOOD", ramp(200, 10.0))
            .with_closes("SHORT", ramp(12, 10.0))
            .with_closes("FAIL", failing)
            .with_frame("NOCLOSE", no_close),
    );
    let cache = PriceCache::new(provider);
    let engine = ForecastEngine::new(Box::new(StubModel {
        panic_on: None,
        fail_on: Some(77.77),
    }));
    let universe = tickers(&["GOOD", "SHORT", "FAIL", "NOCLOSE", "MISSING"]);

    let outcome =
        run_batch(&universe, params(), &cache, &engine, &BatchOptions::default(), None).unwrap();

    assert_eq!(status_of(&outcome.rows, "GOOD"), RowStatus::Ok);
    assert_eq!(status_of(&outcome.rows, "SHORT"), RowStatus::InsufficientData);
    assert_eq!(status_of(&outcome.rows, "FAIL"), RowStatus::ArimaError);
    assert_eq!(status_of(&outcome.rows, "NOCLOSE"), RowStatus::NoData);
    assert_eq!(status_of(&outcome.rows, "MISSING"), RowStatus::NoData);

    let good = outcome
        .rows
        .iter()
        .find(|r| r.row.symbol == "GOOD")
        .unwrap();
    assert!(good.row.is_complete());
    // Window of 120 keeps the most recent prices
    assert_eq!(good.row.min, Some(50.0));
    assert_eq!(good.row.on_mkt, Some(109.5));
}

#[test]
fn panicking_task_becomes_arima_error_without_aborting() {
    let mut boom = ramp(50, 1.0);
    *boom.last_mut().unwrap() = 13.13;
    let provider = Arc::new(
        FixtureProvider::new()
            .with_closes("BOOM", boom)
            .with_closes("AAA", ramp(50, 1.0))
            .with_closes("BBB", ramp(50, 2.0)),
    );
    let cache = PriceCache::new(provider);
    let engine = ForecastEngine::new(Box::new(StubModel {
        panic_on: Some(13.13),
        fail_on: None,
    }));
    let universe = tickers(&["AAA", "BOOM", "BBB"]);

    let outcome =
        run_batch(&universe, params(), &cache, &engine, &BatchOptions::default(), None).unwrap();

    let boom = outcome.rows.iter().find(|r| r.row.symbol == "BOOM").unwrap();
    assert_eq!(boom.row.status, RowStatus::ArimaError);
    assert!(boom.row.is_blank());
    assert_eq!(boom.index, 1);
    assert_eq!(outcome.counts.ok, 2);
}

#[test]
fn progress_reports_each_row_in_completion_order() {
    let universe = TickerUniverse::default_universe();
    let cache = PriceCache::new(Arc::new(SyntheticProvider::new(end_date())));
    let engine = ForecastEngine::new(Box::new(StubModel::plain()));
    let seen: Mutex<Vec<(String, f64)>> = Mutex::new(Vec::new());
    let cb = |p: &BatchProgress| {
        seen.lock()
            .unwrap()
            .push((p.row.symbol.clone(), p.fraction()));
    };

    let outcome = run_batch(
        universe.tickers(),
        params(),
        &cache,
        &engine,
        &BatchOptions {
            workers: 3,
            ..Default::default()
        },
        Some(&cb),
    )
    .unwrap();

    let seen = seen.into_inner().unwrap();
    assert_eq!(seen.len(), universe.len());
    assert!(seen.windows(2).all(|w| w[0].1 < w[1].1));
    assert!((seen.last().unwrap().1 - 1.0).abs() < f64::EPSILON);
    let completion: Vec<String> = outcome.rows.iter().map(|r| r.row.symbol.clone()).collect();
    let reported: Vec<String> = seen.into_iter().map(|(s, _)| s).collect();
    assert_eq!(completion, reported);
}

#[test]
fn real_arima_runs_on_synthetic_universe() {
    let universe = TickerUniverse::default_universe();
    let tickers = &universe.tickers()[..6];
    let cache = PriceCache::new(Arc::new(
        SyntheticProvider::new(end_date()).with_short_history(&tickers[5].symbol, 10),
    ));
    let engine = ForecastEngine::default();

    let outcome =
        run_batch(tickers, params(), &cache, &engine, &BatchOptions::default(), None).unwrap();

    assert_eq!(outcome.counts.insufficient_data, 1);
    assert_eq!(outcome.counts.ok + outcome.counts.arima_error, 5);
    assert!(outcome.counts.ok >= 1);
    for r in outcome.rows.iter().filter(|r| r.row.status.is_ok()) {
        let (lo, v, hi) = (
            r.row.forecast_min.unwrap(),
            r.row.forecast_value.unwrap(),
            r.row.forecast_max.unwrap(),
        );
        assert!(lo <= v && v <= hi, "{}: {lo} {v} {hi}", r.row.symbol);
    }
}

// ── Aggregation ──────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Shuffled completion order yields the same declaration-ordered table.
    #[test]
    fn declaration_order_is_completion_independent(seed in any::<u64>()) {
        let universe = TickerUniverse::default_universe();
        let cache = PriceCache::new(Arc::new(SyntheticProvider::new(end_date())));
        let engine = ForecastEngine::new(Box::new(StubModel::plain()));
        let outcome = run_batch(
            universe.tickers(), params(), &cache, &engine, &BatchOptions::default(), None,
        ).unwrap();

        let baseline = ScreenerTable::assemble(outcome.rows.clone(), RowOrder::Declaration);
        let mut shuffled = outcome.rows.clone();
        shuffled.shuffle(&mut rand::rngs::StdRng::seed_from_u64(seed));
        let reassembled = ScreenerTable::assemble(shuffled, RowOrder::Declaration);

        prop_assert_eq!(&baseline, &reassembled);
        let symbols: Vec<&str> = reassembled.rows().map(|r| r.symbol.as_str()).collect();
        let declared: Vec<&str> = universe.tickers().iter().map(|t| t.symbol.as_str()).collect();
        prop_assert_eq!(symbols, declared);
    }
}
