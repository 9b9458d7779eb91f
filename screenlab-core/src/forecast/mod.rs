//! Price forecasting: ARIMA fitter and the memoizing forecast engine.

pub mod arima;
pub mod engine;

pub use arima::{ArimaFit, ArimaModel, ArimaOrder, NelderMead};
pub use engine::{ForecastEngine, FORECAST_CACHE_TTL, MIN_OBSERVATIONS};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Two-sided 95% normal quantile.
pub const Z_95: f64 = 1.959963984540054;
pub const CONFIDENCE_95: f64 = 0.95;

/// Point forecast and interval bounds at the final step of a horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ForecastError {
    #[error("need at least {needed} observations, got {got}")]
    InsufficientHistory { needed: usize, got: usize },

    #[error("optimizer did not converge after {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error("numerical instability: {0}")]
    NumericalInstability(String),

    #[error("unsupported model order {0}")]
    InvalidOrder(ArimaOrder),
}

/// A fitted-on-demand forecasting model.
///
/// Implementations must be pure: same values and steps, same forecast.
pub trait ForecastModel: Send + Sync {
    fn name(&self) -> String;

    /// Order used for cache keys.
    fn order(&self) -> ArimaOrder;

    fn forecast(&self, values: &[f64], steps: usize) -> Result<Forecast, ForecastError>;
}
