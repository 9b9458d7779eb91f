//! Descriptive statistics over a closing-price window.

use serde::{Deserialize, Serialize};

/// Round to 2 decimals, halves away from zero.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Percent change from `base` to `target`; 0 when `base` is 0.
pub fn percent_change(base: f64, target: f64) -> f64 {
    if base == 0.0 {
        0.0
    } else {
        (target - base) / base * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
    pub last: f64,
}

impl SummaryStats {
    /// `None` for an empty slice.
    pub fn compute(values: &[f64]) -> Option<Self> {
        let last = *values.last()?;
        let (min, max, sum) = values.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(lo, hi, sum), &v| (lo.min(v), hi.max(v), sum + v),
        );
        Some(Self {
            min,
            avg: sum / values.len() as f64,
            max,
            last,
        })
    }

    pub fn rounded(self) -> Self {
        Self {
            min: round2(self.min),
            avg: round2(self.avg),
            max: round2(self.max),
            last: round2(self.last),
        }
    }
}
