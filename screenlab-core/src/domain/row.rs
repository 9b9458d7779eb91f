//! Screener row: one immutable record per ticker per run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of computing a row, evaluated in this order (first match wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowStatus {
    /// Symbol missing from the payload, or no usable closing-price data.
    NoData,
    /// Fewer than the minimum observations after truncation.
    InsufficientData,
    /// Model fit failed, or the row computation failed unexpectedly.
    ArimaError,
    Ok,
}

impl RowStatus {
    pub fn is_ok(self) -> bool {
        self == RowStatus::Ok
    }

    /// Label shown in tables and exports.
    pub fn label(self) -> &'static str {
        match self {
            RowStatus::NoData => "NO DATA",
            RowStatus::InsufficientData => "INSUFFICIENT DATA",
            RowStatus::ArimaError => "ARIMA ERROR",
            RowStatus::Ok => "OK",
        }
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One screener record. `None` is the "missing" sentinel for numeric fields;
/// every `Some` value is already rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenerRow {
    pub name: String,
    pub symbol: String,
    pub status: RowStatus,
    /// Last observed close ("ON MKT").
    pub on_mkt: Option<f64>,
    pub min: Option<f64>,
    pub avg: Option<f64>,
    pub max: Option<f64>,
    pub forecast_min: Option<f64>,
    pub forecast_value: Option<f64>,
    pub forecast_max: Option<f64>,
    /// Percent change from `on_mkt` to `forecast_value`.
    pub delta_pct: Option<f64>,
}

impl ScreenerRow {
    /// A row with the given status and every numeric field missing.
    pub fn empty(name: impl Into<String>, symbol: impl Into<String>, status: RowStatus) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            status,
            on_mkt: None,
            min: None,
            avg: None,
            max: None,
            forecast_min: None,
            forecast_value: None,
            forecast_max: None,
            delta_pct: None,
        }
    }

    /// Numeric fields in display order.
    pub fn numeric_fields(&self) -> [Option<f64>; 8] {
        [
            self.on_mkt,
            self.min,
            self.avg,
            self.max,
            self.forecast_min,
            self.forecast_value,
            self.forecast_max,
            self.delta_pct,
        ]
    }

    /// True when every numeric field is populated.
    pub fn is_complete(&self) -> bool {
        self.numeric_fields().iter().all(Option::is_some)
    }

    /// True when every numeric field is missing.
    pub fn is_blank(&self) -> bool {
        self.numeric_fields().iter().all(Option::is_none)
    }
}

/// Number of rows per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub ok: usize,
    pub no_data: usize,
    pub insufficient_data: usize,
    pub arima_error: usize,
}

impl StatusCounts {
    pub fn tally<'a>(rows: impl IntoIterator<Item = &'a ScreenerRow>) -> Self {
        let mut counts = Self::default();
        for row in rows {
            counts.record(row.status);
        }
        counts
    }

    pub fn record(&mut self, status: RowStatus) {
        match status {
            RowStatus::Ok => self.ok += 1,
            RowStatus::NoData => self.no_data += 1,
            RowStatus::InsufficientData => self.insufficient_data += 1,
            RowStatus::ArimaError => self.arima_error += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.ok + self.no_data + self.insufficient_data + self.arima_error
    }
}

impl fmt::Display for StatusCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} OK, {} no data, {} insufficient, {} ARIMA errors",
            self.ok, self.no_data, self.insufficient_data, self.arima_error
        )
    }
}
