//! Closing-price series: the clean per-symbol input to statistics and forecasting.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Ordered (date, close) observations for one symbol.
///
/// Invariants (established by the extractor): dates strictly increasing,
/// every price finite, length no greater than the requested window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseSeries {
    pub symbol: String,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl CloseSeries {
    /// Build from already-clean parallel vectors.
    ///
    /// Callers outside the extractor are expected to pass sorted, finite data;
    /// debug builds assert it.
    pub fn new(symbol: impl Into<String>, dates: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        debug_assert_eq!(dates.len(), values.len());
        debug_assert!(dates.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(values.iter().all(|v| v.is_finite()));
        Self {
            symbol: symbol.into(),
            dates,
            values,
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Most recent observation.
    pub fn last(&self) -> Option<(NaiveDate, f64)> {
        Some((*self.dates.last()?, *self.values.last()?))
    }

    /// Keep only the most recent `n` observations.
    pub fn tail(mut self, n: usize) -> Self {
        if self.values.len() > n {
            let cut = self.values.len() - n;
            self.dates.drain(..cut);
            self.values.drain(..cut);
        }
        self
    }
}
