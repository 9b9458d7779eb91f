//! Row computer: one ticker in, one screener row out.
//!
//! Status precedence (first match wins): NO_DATA, INSUFFICIENT_DATA,
//! ARIMA_ERROR, OK. Every stored number is rounded to 2 decimals.

use screenlab_core::data::{extract_close, PricePayload};
use screenlab_core::domain::{RowStatus, RunParams, ScreenerRow, Ticker};
use screenlab_core::forecast::{ForecastEngine, ForecastError, MIN_OBSERVATIONS};
use screenlab_core::stats::{percent_change, round2, SummaryStats};

/// Compute the screener row for `ticker` against a shared payload.
///
/// Never fails: every expected failure mode maps to a status. Panics are left
/// to the caller, which isolates each ticker.
pub fn compute_row(
    ticker: &Ticker,
    params: RunParams,
    payload: &PricePayload,
    engine: &ForecastEngine,
) -> ScreenerRow {
    let symbol = ticker.symbol.as_str();
    let no_data = || ScreenerRow::empty(&ticker.name, symbol, RowStatus::NoData);

    let Some(frame) = payload.get(symbol) else {
        tracing::debug!(symbol, "symbol missing from payload");
        return no_data();
    };

    let series = match extract_close(symbol, frame, params.window.observations()) {
        Ok(series) => series,
        Err(err) => {
            tracing::debug!(symbol, error = %err, "no usable closing prices");
            return no_data();
        }
    };
    let Some(stats) = SummaryStats::compute(series.values()) else {
        return no_data();
    };
    let stats = stats.rounded();

    let mut row = ScreenerRow::empty(&ticker.name, symbol, RowStatus::InsufficientData);
    row.on_mkt = Some(stats.last);
    if series.len() < MIN_OBSERVATIONS {
        return row;
    }

    row.min = Some(stats.min);
    row.avg = Some(stats.avg);
    row.max = Some(stats.max);

    match engine.forecast(&series, params.horizon.steps()) {
        Ok(forecast) => {
            let value = round2(forecast.point);
            row.forecast_min = Some(round2(forecast.lower));
            row.forecast_value = Some(value);
            row.forecast_max = Some(round2(forecast.upper));
            row.delta_pct = Some(round2(percent_change(stats.last, value)));
            row.status = RowStatus::Ok;
        }
        Err(ForecastError::InsufficientHistory { .. }) => {
            row.min = None;
            row.avg = None;
            row.max = None;
        }
        Err(err) => {
            tracing::warn!(symbol, error = %err, "forecast failed");
            row.status = RowStatus::ArimaError;
        }
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use screenlab_core::data::{bars_to_frame, DataSource, RawBar};
    use screenlab_core::domain::{ForecastHorizon, HistoricalWindow};
    use screenlab_core::forecast::{ArimaOrder, Forecast, ForecastModel};

    struct Fixed(f64);

    impl ForecastModel for Fixed {
        fn name(&self) -> String {
            "fixed".into()
        }

        fn order(&self) -> ArimaOrder {
            ArimaOrder::SCREENING
        }

        fn forecast(&self, _values: &[f64], _steps: usize) -> Result<Forecast, ForecastError> {
            Ok(Forecast {
                point: self.0,
                lower: self.0 - 10.004,
                upper: self.0 + 10.006,
                confidence: 0.95,
            })
        }
    }

    struct Failing;

    impl ForecastModel for Failing {
        fn name(&self) -> String {
            "failing".into()
        }

        fn order(&self) -> ArimaOrder {
            ArimaOrder::SCREENING
        }

        fn forecast(&self, _values: &[f64], _steps: usize) -> Result<Forecast, ForecastError> {
            Err(ForecastError::NotConverged { iterations: 10 })
        }
    }

    fn payload_with(symbol: &str, closes: &[f64]) -> PricePayload {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
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
                volume: Some(1),
            })
            .collect();
        let mut payload = PricePayload::new(DataSource::Synthetic);
        payload.insert(symbol, bars_to_frame(&bars).unwrap());
        payload
    }

    fn params() -> RunParams {
        RunParams::new(HistoricalWindow::Days120, ForecastHorizon::Days30)
    }

    fn ticker() -> Ticker {
        Ticker::new("TEST CO", "TST")
    }

    #[test]
    fn missing_symbol_is_no_data() {
        let engine = ForecastEngine::new(Box::new(Fixed(1.0)));
        let row = compute_row(&ticker(), params(), &PricePayload::unavailable(), &engine);
        assert_eq!(row.status, RowStatus::NoData);
        assert!(row.is_blank());
    }

    #[test]
    fn short_history_populates_only_on_mkt() {
        let engine = ForecastEngine::new(Box::new(Fixed(1.0)));
        let closes: Vec<f64> = (0..19).map(|i| 10.0 + i as f64).collect();
        let row = compute_row(&ticker(), params(), &payload_with("TST", &closes), &engine);
        assert_eq!(row.status, RowStatus::InsufficientData);
        assert_eq!(row.on_mkt, Some(28.0));
        assert!(row.min.is_none() && row.forecast_value.is_none());
        assert_eq!(engine.fit_count(), 0);
    }

    #[test]
    fn ok_row_is_complete_and_rounded() {
        let engine = ForecastEngine::new(Box::new(Fixed(120.0)));
        let mut closes = vec![90.0; 29];
        closes.push(100.0);
        let row = compute_row(&ticker(), params(), &payload_with("TST", &closes), &engine);
        assert_eq!(row.status, RowStatus::Ok);
        assert!(row.is_complete());
        assert_eq!(row.on_mkt, Some(100.0));
        assert_eq!(row.min, Some(90.0));
        assert_eq!(row.max, Some(100.0));
        assert_eq!(row.forecast_value, Some(120.0));
        assert_eq!(row.forecast_min, Some(110.0));
        assert_eq!(row.forecast_max, Some(130.01));
        assert_eq!(row.delta_pct, Some(20.0));
    }

    #[test]
    fn forecast_failure_keeps_summary_fields() {
        let engine = ForecastEngine::new(Box::new(Failing));
        let closes: Vec<f64> = (0..40).map(|i| 50.0 + i as f64).collect();
        let row = compute_row(&ticker(), params(), &payload_with("TST", &closes), &engine);
        assert_eq!(row.status, RowStatus::ArimaError);
        assert_eq!(row.on_mkt, Some(89.0));
        assert_eq!(row.min, Some(50.0));
        assert!(row.forecast_value.is_none() && row.delta_pct.is_none());
    }

    #[test]
    fn window_truncates_before_statistics() {
        let engine = ForecastEngine::new(Box::new(Fixed(1.0)));
        let closes: Vec<f64> = (0..200).map(|i| i as f64 + 1.0).collect();
        let row = compute_row(&ticker(), params(), &payload_with("TST", &closes), &engine);
        assert_eq!(row.min, Some(81.0));
        assert_eq!(row.max, Some(200.0));
    }
}
