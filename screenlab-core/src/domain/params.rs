//! Run parameters: historical window, forecast horizon, provider lookback.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("historical window must be one of 120, 360, 720 (got {0})")]
    InvalidWindow(usize),

    #[error("forecast horizon must be one of 30, 60, 120 (got {0})")]
    InvalidHorizon(usize),
}

/// Number of most-recent daily observations retained for analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum HistoricalWindow {
    #[default]
    Days120,
    Days360,
    Days720,
}

impl HistoricalWindow {
    pub const ALL: [HistoricalWindow; 3] = [Self::Days120, Self::Days360, Self::Days720];

    pub fn observations(self) -> usize {
        match self {
            Self::Days120 => 120,
            Self::Days360 => 360,
            Self::Days720 => 720,
        }
    }

    /// Next option, wrapping around (used by selectors).
    pub fn cycle(self) -> Self {
        match self {
            Self::Days120 => Self::Days360,
            Self::Days360 => Self::Days720,
            Self::Days720 => Self::Days120,
        }
    }
}

impl TryFrom<usize> for HistoricalWindow {
    type Error = ParamError;

    fn try_from(n: usize) -> Result<Self, Self::Error> {
        match n {
            120 => Ok(Self::Days120),
            360 => Ok(Self::Days360),
            720 => Ok(Self::Days720),
            other => Err(ParamError::InvalidWindow(other)),
        }
    }
}

impl From<HistoricalWindow> for usize {
    fn from(w: HistoricalWindow) -> usize {
        w.observations()
    }
}

impl fmt::Display for HistoricalWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.observations())
    }
}

/// Number of future trading days the model projects forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum ForecastHorizon {
    #[default]
    Days30,
    Days60,
    Days120,
}

impl ForecastHorizon {
    pub const ALL: [ForecastHorizon; 3] = [Self::Days30, Self::Days60, Self::Days120];

    pub fn steps(self) -> usize {
        match self {
            Self::Days30 => 30,
            Self::Days60 => 60,
            Self::Days120 => 120,
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            Self::Days30 => Self::Days60,
            Self::Days60 => Self::Days120,
            Self::Days120 => Self::Days30,
        }
    }
}

impl TryFrom<usize> for ForecastHorizon {
    type Error = ParamError;

    fn try_from(n: usize) -> Result<Self, Self::Error> {
        match n {
            30 => Ok(Self::Days30),
            60 => Ok(Self::Days60),
            120 => Ok(Self::Days120),
            other => Err(ParamError::InvalidHorizon(other)),
        }
    }
}

impl From<ForecastHorizon> for usize {
    fn from(h: ForecastHorizon) -> usize {
        h.steps()
    }
}

impl fmt::Display for ForecastHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.steps())
    }
}

/// One (window, horizon) configuration pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RunParams {
    pub window: HistoricalWindow,
    pub horizon: ForecastHorizon,
}

impl RunParams {
    pub fn new(window: HistoricalWindow, horizon: ForecastHorizon) -> Self {
        Self { window, horizon }
    }
}

/// Provider retrieval window: a range and a bar interval, in Yahoo notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lookback {
    pub range: &'static str,
    pub interval: &'static str,
}

impl Lookback {
    /// Five years of daily bars, the only lookback runs use.
    pub const FIVE_YEARS_DAILY: Lookback = Lookback {
        range: "5y",
        interval: "1d",
    };

    /// Approximate number of daily bars covered by the range.
    pub fn approx_trading_days(&self) -> usize {
        let years = self
            .range
            .strip_suffix('y')
            .and_then(|y| y.parse::<usize>().ok())
            .unwrap_or(1);
        years * 252
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.range, self.interval)
    }
}
