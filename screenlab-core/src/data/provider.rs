//! Price provider trait, raw payload type and structured data errors.
//!
//! The PriceProvider trait abstracts over data sources (Yahoo Finance, synthetic)
//! so the cache and the pipeline never know which one they talk to, and tests
//! can count calls.

use chrono::{DateTime, NaiveDate, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::Lookback;

/// Name of the date index column every payload frame carries.
pub const DATE_COLUMN: &str = "date";

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("frame construction failed: {0}")]
    Frame(#[from] PolarsError),
}

/// Raw daily record from a provider, before it becomes a frame row.
///
/// Fields are optional because providers report gaps as nulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub adj_close: Option<f64>,
    pub volume: Option<u64>,
}

/// Where a payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    Synthetic,
    /// Returned in place of a failed download.
    Unavailable,
}

/// Result of one bulk download: one frame per symbol the provider had data for.
///
/// Frames carry a `date` column plus one or more price columns. Symbols with
/// no data are simply absent. A download that stopped before requesting every
/// symbol is marked incomplete and is never cached.
#[derive(Debug, Clone)]
pub struct PricePayload {
    frames: HashMap<String, DataFrame>,
    source: DataSource,
    fetched_at: DateTime<Utc>,
    complete: bool,
}

impl PricePayload {
    pub fn new(source: DataSource) -> Self {
        Self {
            frames: HashMap::new(),
            source,
            fetched_at: Utc::now(),
            complete: true,
        }
    }

    /// Payload standing in for a failed provider call.
    pub fn unavailable() -> Self {
        Self::new(DataSource::Unavailable)
    }

    pub fn insert(&mut self, symbol: impl Into<String>, frame: DataFrame) {
        self.frames.insert(symbol.into(), frame);
    }

    pub fn get(&self, symbol: &str) -> Option<&DataFrame> {
        self.frames.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.frames.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.frames.keys().map(|s| s.as_str())
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Flag a download that was cut short before every symbol was requested.
    pub fn mark_incomplete(&mut self) {
        self.complete = false;
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

/// Trait for market data providers.
///
/// One call covers the whole symbol set. The cache layer sits above this
/// trait; providers don't know about the cache.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Download daily history for every symbol over `lookback`.
    ///
    /// A symbol the provider has no data for is omitted from the payload;
    /// only a total failure is an error.
    fn download(&self, symbols: &[String], lookback: Lookback) -> Result<PricePayload, DataError>;
}

/// Convert raw bars into a payload frame with Yahoo-style column names.
pub fn bars_to_frame(bars: &[RawBar]) -> Result<DataFrame, DataError> {
    let epoch = NaiveDate::default();
    let dates: Vec<i32> = bars
        .iter()
        .map(|b| (b.date - epoch).num_days() as i32)
        .collect();
    let opens: Vec<Option<f64>> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<Option<f64>> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<Option<f64>> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<Option<f64>> = bars.iter().map(|b| b.close).collect();
    let adj_closes: Vec<Option<f64>> = bars.iter().map(|b| b.adj_close).collect();
    let volumes: Vec<Option<u64>> = bars.iter().map(|b| b.volume).collect();

    let frame = DataFrame::new(vec![
        Column::new(DATE_COLUMN.into(), dates).cast(&DataType::Date)?,
        Column::new("Open".into(), opens),
        Column::new("High".into(), highs),
        Column::new("Low".into(), lows),
        Column::new("Close".into(), closes),
        Column::new("Adj Close".into(), adj_closes),
        Column::new("Volume".into(), volumes),
    ])?;
    Ok(frame)
}
