//! ScreenLab Core: domain types, market data, forecasting, calculator.
//!
//! This crate contains everything a screening run needs below the orchestrator:
//! - Domain types (ticker universe, run parameters, close series, screener rows)
//! - Price providers (Yahoo Finance, synthetic) behind a single trait
//! - Price Cache with time-based invalidation
//! - Close-series extraction tolerant of schema variation
//! - ARIMA fitting and the memoizing Forecast Engine
//! - Summary statistics and the P&L calculator

pub mod calculator;
pub mod data;
pub mod domain;
pub mod forecast;
pub mod stats;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything shared across worker threads is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::TickerUniverse>();
        require_sync::<domain::TickerUniverse>();
        require_send::<domain::CloseSeries>();
        require_sync::<domain::CloseSeries>();
        require_send::<domain::ScreenerRow>();
        require_sync::<domain::ScreenerRow>();
        require_send::<domain::RunParams>();
        require_sync::<domain::RunParams>();

        // Data layer
        require_send::<data::PricePayload>();
        require_sync::<data::PricePayload>();
        require_send::<data::PriceCache>();
        require_sync::<data::PriceCache>();
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::SyntheticProvider>();
        require_sync::<data::SyntheticProvider>();

        // Forecast layer
        require_send::<forecast::ForecastEngine>();
        require_sync::<forecast::ForecastEngine>();
        require_send::<forecast::ArimaModel>();
        require_sync::<forecast::ArimaModel>();
    }

    /// Architecture contract: forecast models see only price values, never the
    /// payload or the cache. The trait signature enforces it.
    #[test]
    fn forecast_model_takes_only_values() {
        fn _check_trait_object_builds(
            model: &dyn forecast::ForecastModel,
            values: &[f64],
        ) -> Result<forecast::Forecast, forecast::ForecastError> {
            model.forecast(values, 30)
        }
    }
}
