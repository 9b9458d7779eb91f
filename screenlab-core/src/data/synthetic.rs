//! Deterministic synthetic provider for offline runs and tests.
//!
//! Produces a seeded random walk per symbol. Payloads are tagged
//! `DataSource::Synthetic` so they are never mistaken for market data.

use super::provider::{bars_to_frame, DataError, DataSource, PricePayload, PriceProvider, RawBar};
use crate::domain::Lookback;
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};

pub struct SyntheticProvider {
    end: NaiveDate,
    missing: HashSet<String>,
    short: HashMap<String, usize>,
}

impl SyntheticProvider {
    /// Walks end on `end` (inclusive, weekends skipped).
    pub fn new(end: NaiveDate) -> Self {
        Self {
            end,
            missing: HashSet::new(),
            short: HashMap::new(),
        }
    }

    /// Ending today.
    pub fn today() -> Self {
        Self::new(chrono::Utc::now().date_naive())
    }

    /// Leave `symbol` out of every payload.
    pub fn with_missing(mut self, symbol: impl Into<String>) -> Self {
        self.missing.insert(symbol.into());
        self
    }

    /// Produce only `bars` observations for `symbol`.
    pub fn with_short_history(mut self, symbol: impl Into<String>, bars: usize) -> Self {
        self.short.insert(symbol.into(), bars);
        self
    }

    fn bar_count(&self, symbol: &str, lookback: Lookback) -> usize {
        self.short
            .get(symbol)
            .copied()
            .unwrap_or_else(|| lookback.approx_trading_days())
    }
}

/// Seeded random walk of `count` weekday bars ending on or before `end`.
pub fn synthetic_bars(symbol: &str, end: NaiveDate, count: usize) -> Vec<RawBar> {
    // Deterministic seed from symbol name
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut dates = Vec::with_capacity(count);
    let mut current = end;
    while dates.len() < count {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(current);
        }
        current = match current.pred_opt() {
            Some(d) => d,
            None => break,
        };
    }
    dates.reverse();

    let mut price: f64 = rng.gen_range(20.0..500.0);
    let drift: f64 = rng.gen_range(-0.0005..0.0008);
    let mut bars = Vec::with_capacity(dates.len());

    for date in dates {
        let daily_return: f64 = drift + rng.gen_range(-0.02..0.02);
        let open = price;
        let close = (price * (1.0 + daily_return)).max(0.01);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64);

        bars.push(RawBar {
            date,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            adj_close: Some(close),
            volume: Some(volume),
        });
        price = close;
    }

    bars
}

impl PriceProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn download(&self, symbols: &[String], lookback: Lookback) -> Result<PricePayload, DataError> {
        let mut payload = PricePayload::new(DataSource::Synthetic);
        for symbol in symbols {
            if self.missing.contains(symbol) {
                continue;
            }
            let bars = synthetic_bars(symbol, self.end, self.bar_count(symbol, lookback));
            payload.insert(symbol.clone(), bars_to_frame(&bars)?);
        }
        tracing::debug!(symbols = payload.len(), "generated synthetic payload");
        Ok(payload)
    }
}
