//! Result aggregator: completed rows -> stable presentation table.
//!
//! Sort keys are fixed when a row is collected, so assembling the same rows
//! twice (in any arrival order) gives the same table. Values pass through
//! untouched; the table only adds presentation annotations.

use std::fmt;
use std::str::FromStr;

use screenlab_core::domain::{ScreenerRow, StatusCounts};
use serde::{Deserialize, Serialize};

use crate::batch::CompletedRow;

/// Percent delta above which a forecast is highlighted as strong.
pub const STRONG_DELTA_PCT: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOrder {
    /// Universe declaration order.
    #[default]
    Declaration,
    /// Order in which rows finished.
    Completion,
}

impl FromStr for RowOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "declaration" => Ok(RowOrder::Declaration),
            "completion" => Ok(RowOrder::Completion),
            other => Err(format!(
                "unknown row order '{other}' (expected declaration or completion)"
            )),
        }
    }
}

impl fmt::Display for RowOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowOrder::Declaration => write!(f, "declaration"),
            RowOrder::Completion => write!(f, "completion"),
        }
    }
}

/// Forecast value relative to the last price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastTone {
    Above,
    Below,
    Flat,
}

/// Highlight class for the percent delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaTone {
    Strong,
    Negative,
    Neutral,
}

/// Presentation hints for one row. Renderers map these to colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowAnnotations {
    pub forecast: Option<ForecastTone>,
    pub delta: Option<DeltaTone>,
    /// Status other than OK.
    pub attention: bool,
}

impl RowAnnotations {
    pub fn for_row(row: &ScreenerRow) -> Self {
        let forecast = match (row.on_mkt, row.forecast_value) {
            (Some(on_mkt), Some(value)) if value > on_mkt => Some(ForecastTone::Above),
            (Some(on_mkt), Some(value)) if value < on_mkt => Some(ForecastTone::Below),
            (Some(_), Some(_)) => Some(ForecastTone::Flat),
            _ => None,
        };
        let delta = row.delta_pct.map(|d| {
            if d > STRONG_DELTA_PCT {
                DeltaTone::Strong
            } else if d < 0.0 {
                DeltaTone::Negative
            } else {
                DeltaTone::Neutral
            }
        });
        Self {
            forecast,
            delta,
            attention: !row.status.is_ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenerTable {
    rows: Vec<CompletedRow>,
    order: RowOrder,
}

impl ScreenerTable {
    pub fn assemble(completed: impl IntoIterator<Item = CompletedRow>, order: RowOrder) -> Self {
        let mut rows: Vec<CompletedRow> = completed.into_iter().collect();
        match order {
            RowOrder::Declaration => rows.sort_by_key(|r| (r.index, r.sequence)),
            RowOrder::Completion => rows.sort_by_key(|r| (r.sequence, r.index)),
        }
        Self { rows, order }
    }

    pub fn order(&self) -> RowOrder {
        self.order
    }

    pub fn rows(&self) -> impl Iterator<Item = &ScreenerRow> {
        self.rows.iter().map(|r| &r.row)
    }

    pub fn entries(&self) -> &[CompletedRow] {
        &self.rows
    }

    pub fn annotated(&self) -> impl Iterator<Item = (&ScreenerRow, RowAnnotations)> {
        self.rows().map(|row| (row, RowAnnotations::for_row(row)))
    }

    pub fn counts(&self) -> StatusCounts {
        StatusCounts::tally(self.rows())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
