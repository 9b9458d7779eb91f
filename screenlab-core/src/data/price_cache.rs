//! Time-bounded memoization of bulk price downloads.
//!
//! One entry per (symbol set, lookback). Entries are shared as
//! `Arc<PricePayload>` so concurrent readers never copy frames.

use super::provider::{PricePayload, PriceProvider};
use crate::domain::Lookback;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default time-to-live for cached payloads.
pub const PRICE_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Sorted, deduplicated symbol set plus the retrieval window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    symbols: Vec<String>,
    lookback: Lookback,
}

impl CacheKey {
    pub fn new(symbols: &[String], lookback: Lookback) -> Self {
        let mut symbols = symbols.to_vec();
        symbols.sort();
        symbols.dedup();
        Self { symbols, lookback }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }
}

struct CacheEntry {
    payload: Arc<PricePayload>,
    cached_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() < ttl
    }
}

pub struct PriceCache {
    provider: Arc<dyn PriceProvider>,
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
}

impl PriceCache {
    pub fn new(provider: Arc<dyn PriceProvider>) -> Self {
        Self::with_ttl(provider, PRICE_CACHE_TTL)
    }

    pub fn with_ttl(provider: Arc<dyn PriceProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Return the payload for `symbols`, downloading at most once per TTL.
    ///
    /// Never fails: a provider error or empty result is logged and an empty,
    /// uncached payload is returned. A partial download is returned as is but
    /// not cached, so the next call retries the whole set.
    pub fn fetch(&self, symbols: &[String], lookback: Lookback) -> Arc<PricePayload> {
        let key = CacheKey::new(symbols, lookback);

        if let Some(entry) = self.entries.get(&key) {
            if entry.is_fresh(self.ttl) {
                tracing::debug!(symbols = key.symbols.len(), %lookback, "price cache hit");
                return Arc::clone(&entry.payload);
            }
        }

        tracing::debug!(symbols = key.symbols.len(), %lookback, "price cache miss");
        let payload = match self.provider.download(&key.symbols, lookback) {
            Ok(p) if !p.is_empty() => Arc::new(p),
            Ok(_) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    "provider returned no data; nothing cached"
                );
                return Arc::new(PricePayload::unavailable());
            }
            Err(err) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    error = %err,
                    "price download failed; nothing cached"
                );
                return Arc::new(PricePayload::unavailable());
            }
        };

        let missing = key
            .symbols
            .iter()
            .filter(|s| !payload.contains(s))
            .count();
        if missing > 0 {
            tracing::info!(missing, fetched = payload.len(), "some symbols had no data");
        }
        if !payload.is_complete() {
            tracing::warn!(
                provider = self.provider.name(),
                fetched = payload.len(),
                "download was cut short; nothing cached"
            );
            return payload;
        }

        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_fresh(self.ttl) {
                    // Another caller filled the key while we downloaded
                    return Arc::clone(&occupied.get().payload);
                }
                occupied.insert(CacheEntry {
                    payload: Arc::clone(&payload),
                    cached_at: Instant::now(),
                });
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry {
                    payload: Arc::clone(&payload),
                    cached_at: Instant::now(),
                });
            }
        }
        payload
    }

    /// Drop every stale entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(self.ttl));
        before - self.entries.len()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.value().is_fresh(self.ttl))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
