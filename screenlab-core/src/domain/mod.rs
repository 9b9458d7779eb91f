//! Domain types shared by every layer.

pub mod params;
pub mod row;
pub mod series;
pub mod universe;

pub use params::{ForecastHorizon, HistoricalWindow, Lookback, ParamError, RunParams};
pub use row::{RowStatus, ScreenerRow, StatusCounts};
pub use series::CloseSeries;
pub use universe::{Ticker, TickerUniverse, UniverseError};
