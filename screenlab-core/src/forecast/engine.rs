//! Forecast engine: minimum-history guard plus a TTL memo over model fits.

use super::{ArimaModel, ArimaOrder, Forecast, ForecastError, ForecastModel};
use crate::domain::CloseSeries;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Fewest observations a series needs before a forecast is attempted.
pub const MIN_OBSERVATIONS: usize = 20;

/// Default time-to-live for memoized forecasts.
pub const FORECAST_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Memo key: series identity (hash of value bit patterns), horizon, order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ForecastKey {
    series: [u8; 32],
    steps: usize,
    order: ArimaOrder,
}

impl ForecastKey {
    fn new(values: &[f64], steps: usize, order: ArimaOrder) -> Self {
        let mut hasher = blake3::Hasher::new();
        for v in values {
            hasher.update(&v.to_bits().to_le_bytes());
        }
        Self {
            series: *hasher.finalize().as_bytes(),
            steps,
            order,
        }
    }
}

struct MemoEntry {
    forecast: Forecast,
    cached_at: Instant,
}

pub struct ForecastEngine {
    model: Box<dyn ForecastModel>,
    memo: DashMap<ForecastKey, MemoEntry>,
    ttl: Duration,
    fits: AtomicUsize,
}

impl Default for ForecastEngine {
    fn default() -> Self {
        Self::new(Box::new(ArimaModel::default()))
    }
}

impl ForecastEngine {
    pub fn new(model: Box<dyn ForecastModel>) -> Self {
        Self::with_ttl(model, FORECAST_CACHE_TTL)
    }

    pub fn with_ttl(model: Box<dyn ForecastModel>, ttl: Duration) -> Self {
        Self {
            model,
            memo: DashMap::new(),
            ttl,
            fits: AtomicUsize::new(0),
        }
    }

    pub fn model_name(&self) -> String {
        self.model.name()
    }

    /// Forecast `steps` ahead, reusing a memoized result when one is fresh.
    pub fn forecast(&self, series: &CloseSeries, steps: usize) -> Result<Forecast, ForecastError> {
        let values = series.values();
        if values.len() < MIN_OBSERVATIONS {
            return Err(ForecastError::InsufficientHistory {
                needed: MIN_OBSERVATIONS,
                got: values.len(),
            });
        }

        let key = ForecastKey::new(values, steps, self.model.order());
        if let Some(entry) = self.memo.get(&key) {
            if entry.cached_at.elapsed() < self.ttl {
                tracing::trace!(symbol = series.symbol.as_str(), steps, "forecast memo hit");
                return Ok(entry.forecast);
            }
        }

        self.fits.fetch_add(1, Ordering::Relaxed);
        let forecast = self.model.forecast(values, steps)?;
        if !(forecast.point.is_finite() && forecast.lower.is_finite() && forecast.upper.is_finite())
        {
            return Err(ForecastError::NumericalInstability(
                "model returned a non-finite forecast".into(),
            ));
        }

        Ok(self.memoize(key, forecast))
    }

    /// Store `forecast` unless a fresh entry already holds the key; returns
    /// whichever forecast the memo keeps.
    fn memoize(&self, key: ForecastKey, forecast: Forecast) -> Forecast {
        let entry = MemoEntry {
            forecast,
            cached_at: Instant::now(),
        };
        match self.memo.entry(key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().cached_at.elapsed() < self.ttl {
                    return occupied.get().forecast;
                }
                occupied.insert(entry);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
            }
        }
        forecast
    }

    /// Number of model fits performed so far.
    pub fn fit_count(&self) -> usize {
        self.fits.load(Ordering::Relaxed)
    }

    pub fn purge_expired(&self) -> usize {
        let before = self.memo.len();
        self.memo
            .retain(|_, entry| entry.cached_at.elapsed() < self.ttl);
        before - self.memo.len()
    }

    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }
}
