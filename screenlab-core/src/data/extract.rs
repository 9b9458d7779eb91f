//! Series extraction: raw payload frame -> clean closing-price series.
//!
//! Tolerant of schema variation. The closing-price column is resolved as:
//! 1. a column named exactly `Close`
//! 2. the only price column, when the frame has exactly one
//! 3. the first column whose name contains "close" (case-insensitive)

use super::provider::DATE_COLUMN;
use crate::domain::CloseSeries;
use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("frame has no rows")]
    EmptyFrame,

    #[error("frame has no usable 'date' column")]
    MissingDateIndex,

    #[error("no closing-price column among {columns:?}")]
    NoCloseColumn { columns: Vec<String> },

    #[error("no valid observations after dropping nulls")]
    NoValidObservations,

    #[error("frame access failed: {0}")]
    Frame(#[from] PolarsError),
}

/// Pick the closing-price column name.
pub fn resolve_close_column(frame: &DataFrame) -> Result<String, ExtractError> {
    let price_columns: Vec<String> = frame
        .get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .filter(|n| n != DATE_COLUMN)
        .collect();

    if price_columns.iter().any(|n| n == "Close") {
        return Ok("Close".to_string());
    }
    if price_columns.len() == 1 {
        return Ok(price_columns[0].clone());
    }
    price_columns
        .iter()
        .find(|n| n.to_lowercase().contains("close"))
        .cloned()
        .ok_or(ExtractError::NoCloseColumn {
            columns: price_columns,
        })
}

fn date_days(frame: &DataFrame) -> Result<Vec<Option<i32>>, ExtractError> {
    let column = frame
        .column(DATE_COLUMN)
        .map_err(|_| ExtractError::MissingDateIndex)?;
    let column = match column.dtype() {
        DataType::Date => column.clone(),
        DataType::Datetime(_, _) => column.cast(&DataType::Date)?,
        _ => return Err(ExtractError::MissingDateIndex),
    };
    let dates = column.date().map_err(|_| ExtractError::MissingDateIndex)?;
    Ok((0..dates.len()).map(|i| dates.get(i)).collect())
}

/// Extract the most recent `window` closing prices for `symbol`.
///
/// Nulls and non-finite values are dropped first, then the series is sorted by
/// date (last record wins on duplicate dates) and truncated.
pub fn extract_close(
    symbol: &str,
    frame: &DataFrame,
    window: usize,
) -> Result<CloseSeries, ExtractError> {
    if frame.height() == 0 {
        return Err(ExtractError::EmptyFrame);
    }

    let days = date_days(frame)?;
    let close_name = resolve_close_column(frame)?;
    let prices = frame.column(&close_name)?.cast(&DataType::Float64)?;
    let prices = prices.f64()?;

    let epoch = NaiveDate::default();
    let mut observations: Vec<(NaiveDate, f64)> = days
        .iter()
        .enumerate()
        .filter_map(|(i, day)| {
            let day = (*day)?;
            let price = prices.get(i)?;
            if !price.is_finite() {
                return None;
            }
            let date = epoch.checked_add_signed(chrono::Duration::days(day as i64))?;
            Some((date, price))
        })
        .collect();

    if observations.is_empty() {
        return Err(ExtractError::NoValidObservations);
    }

    observations.sort_by_key(|(date, _)| *date);
    let mut deduped: Vec<(NaiveDate, f64)> = Vec::with_capacity(observations.len());
    for (date, price) in observations {
        match deduped.last_mut() {
            Some(last) if last.0 == date => last.1 = price,
            _ => deduped.push((date, price)),
        }
    }

    let (dates, values): (Vec<NaiveDate>, Vec<f64>) = deduped.into_iter().unzip();
    Ok(CloseSeries::new(symbol, dates, values).tail(window))
}
