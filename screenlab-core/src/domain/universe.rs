//! Ticker universe: the ordered list of (display name, symbol) pairs to screen.
//!
//! The universe can be stored as a TOML file:
//!
//! ```toml
//! [[tickers]]
//! name = "NVIDIA"
//! symbol = "NVDA"
//! ```
//!
//! Declaration order is preserved; it drives the default table order.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Errors from loading or validating a universe.
#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("read universe file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse universe TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize universe: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("universe is empty")]
    Empty,

    #[error("duplicate symbol '{0}' in universe")]
    DuplicateSymbol(String),

    #[error("ticker entry {index} has a blank name or symbol")]
    BlankEntry { index: usize },
}

/// One universe member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker {
    pub name: String,
    pub symbol: String,
}

impl Ticker {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
        }
    }
}

/// The complete, validated universe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerUniverse {
    tickers: Vec<Ticker>,
}

/// Default universe, in declaration order.
const DEFAULT_TICKERS: &[(&str, &str)] = &[
    ("ALPHABET INC", "GOOGL"),
    ("AMAZON", "AMZN"),
    ("AMERICA AIRLINES", "AAL"),
    ("AMERICAN BATTERY TECHNOLOGY COMPANY", "ABAT"),
    ("ATOSSA THERAPEUTICS INC", "ATOS"),
    ("ALIBABA GROUP HOLDING", "BABA"),
    ("BANK OF AMERICA CORP", "BAC"),
    ("BEYOND MEAT", "BYND"),
    ("CENOVUS ENERGY INC", "CVE"),
    ("CERENCE", "CRNC"),
    ("CLEAN ENERGY FUELS CORP", "CLNE"),
    ("COMCAST CORPORATION", "CMCSA"),
    ("COTERRA ENERGY INC", "CTRA"),
    ("CRONOS GROUP INC", "CRON"),
    ("DELTA AIRLINES", "DAL"),
    ("DEVON ENERGY CORPORATION", "DVN"),
    ("EBAY INC", "EBAY"),
    ("FISERV", "FISV"),
    ("FORD MOTOR CO", "F"),
    ("HASBRO", "HAS"),
    ("HP INC", "HPQ"),
    ("HUNTINGTON BANCSHARES INC", "HBAN"),
    ("ICAHN ENTERPRISES LP", "IEP"),
    ("INCANNEX HEALTHCARE INC", "IXHL"),
    ("INTEL", "INTC"),
    ("IONIS PHARMACEUTICALS", "IONS"),
    ("KOSMOS ENERGY LTD", "KOS"),
    ("LYFT INC", "LYFT"),
    ("NETFLIX", "NFLX"),
    ("NEW FORTRESS ENERGY INC", "NFE"),
    ("NVIDIA", "NVDA"),
    ("PAYPAL HOLDINGS INC", "PYPL"),
    ("PELOTON INTERACTIVE", "PTON"),
    ("PINTEREST INC", "PINS"),
    ("REVIVA PHARMACEUTICALS HOLDING INC", "RVPH"),
    ("RIVIAN AUTOMOTIVE INC", "RIVN"),
    ("SNAP INC", "SNAP"),
    ("TARGET HOSPITAL CORP", "TH"),
    ("THE COCA-COLA COMPANY", "KO"),
    ("THE WALT DISNEY COMPANY", "DIS"),
    ("TESLA", "TSLA"),
    ("TILRAY BRANDS INC", "TLRY"),
    ("TRANSOCEAN LTD", "RIG"),
    ("TRAWS PHARMA INC", "TRAW"),
    ("UNIQURE NV", "QURE"),
    ("VITAL ENERGY INC", "VTLE"),
];

impl TickerUniverse {
    /// Build a universe, rejecting empty lists, blank entries and duplicate symbols.
    pub fn new(tickers: Vec<Ticker>) -> Result<Self, UniverseError> {
        if tickers.is_empty() {
            return Err(UniverseError::Empty);
        }

        let mut seen = HashSet::with_capacity(tickers.len());
        for (index, t) in tickers.iter().enumerate() {
            if t.name.trim().is_empty() || t.symbol.trim().is_empty() {
                return Err(UniverseError::BlankEntry { index });
            }
            if !seen.insert(t.symbol.as_str()) {
                return Err(UniverseError::DuplicateSymbol(t.symbol.clone()));
            }
        }

        Ok(Self { tickers })
    }

    /// Load a universe from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, UniverseError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a universe from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, UniverseError> {
        let raw: TickerUniverse = toml::from_str(content)?;
        Self::new(raw.tickers)
    }

    /// Serialize the universe to TOML.
    pub fn to_toml(&self) -> Result<String, UniverseError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The built-in screening universe.
    pub fn default_universe() -> Self {
        Self {
            tickers: DEFAULT_TICKERS
                .iter()
                .map(|(name, symbol)| Ticker::new(*name, *symbol))
                .collect(),
        }
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    /// All symbols in declaration order.
    pub fn symbols(&self) -> Vec<String> {
        self.tickers.iter().map(|t| t.symbol.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// Declaration index of a symbol.
    pub fn position(&self, symbol: &str) -> Option<usize> {
        self.tickers.iter().position(|t| t.symbol == symbol)
    }
}

impl Default for TickerUniverse {
    fn default() -> Self {
        Self::default_universe()
    }
}
