//! Data ingestion, caching and series extraction

pub mod extract;
pub mod price_cache;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use extract::{extract_close, resolve_close_column, ExtractError};
pub use price_cache::{CacheKey, PriceCache, PRICE_CACHE_TTL};
pub use provider::{
    bars_to_frame, DataError, DataSource, PricePayload, PriceProvider, RawBar, DATE_COLUMN,
};
pub use synthetic::{synthetic_bars, SyntheticProvider};
pub use yahoo::YahooProvider;
