//! Run configuration loaded from `screenlab.toml`.
//!
//! Every field is optional; missing fields take the defaults below. CLI flags
//! override file values.

use std::path::{Path, PathBuf};

use screenlab_core::domain::{
    ForecastHorizon, HistoricalWindow, RunParams, TickerUniverse, UniverseError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::RowOrder;
use crate::batch::{BatchOptions, DEFAULT_WORKERS};

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "screenlab.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("workers must be at least 1")]
    NoWorkers,

    #[error("universe file: {0}")]
    Universe(#[from] UniverseError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScreenerConfig {
    pub historical_window: HistoricalWindow,
    pub forecast_horizon: ForecastHorizon,
    pub workers: usize,
    pub row_order: RowOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub universe_file: Option<PathBuf>,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            historical_window: HistoricalWindow::default(),
            forecast_horizon: ForecastHorizon::default(),
            workers: DEFAULT_WORKERS,
            row_order: RowOrder::default(),
            universe_file: None,
        }
    }
}

impl ScreenerConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`. A relative `universe_file` is resolved against the
    /// config file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if let (Some(file), Some(dir)) = (config.universe_file.as_mut(), path.parent()) {
            if file.is_relative() {
                *file = dir.join(&*file);
            }
        }
        Ok(config)
    }

    /// Load `path` if given, else `screenlab.toml` when present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    tracing::debug!(path = DEFAULT_CONFIG_FILE, "loading run config");
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        Ok(())
    }

    pub fn run_params(&self) -> RunParams {
        RunParams::new(self.historical_window, self.forecast_horizon)
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            workers: self.workers,
            ..BatchOptions::default()
        }
    }

    /// The configured universe file, or the built-in universe.
    pub fn universe(&self) -> Result<TickerUniverse, ConfigError> {
        match &self.universe_file {
            Some(path) => Ok(TickerUniverse::from_file(path)?),
            None => Ok(TickerUniverse::default_universe()),
        }
    }
}
