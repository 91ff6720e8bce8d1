// src/services/cache.rs
//! Session-scoped memoization of fetched price history.

use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::FetchError;
use crate::models::PriceSeries;

use super::history::HistorySource;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Successful fetches keyed by `(symbol, start, end)`.
///
/// Only the latest window per `(symbol, start)` is kept: storing a newer `end`
/// evicts the older ones, so a long-running server holds one series per symbol
/// rather than one per day. Failures are not stored.
#[derive(Debug, Clone, Default)]
pub struct SeriesCache {
    inner: Arc<RwLock<HashMap<CacheKey, PriceSeries>>>,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &CacheKey) -> Option<PriceSeries> {
        self.inner.read().await.get(key).cloned()
    }

    /// Stores `series`, unless a later window for the same symbol is already held.
    pub async fn put(&self, key: CacheKey, series: PriceSeries) {
        let mut map = self.inner.write().await;
        let superseded = map
            .keys()
            .any(|k| k.symbol == key.symbol && k.start == key.start && k.end > key.end);
        if superseded {
            return;
        }
        let before = map.len();
        map.retain(|k, _| !(k.symbol == key.symbol && k.start == key.start && k.end < key.end));
        if map.len() < before {
            debug!("Evicted {} stale window(s) for {}", before - map.len(), key.symbol);
        }
        map.insert(key, series);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

/// Read-through wrapper putting a [`SeriesCache`] in front of any source.
pub struct CachedHistory<S> {
    source: S,
    cache: SeriesCache,
}

impl<S: HistorySource> CachedHistory<S> {
    pub fn new(source: S, cache: SeriesCache) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }
}

#[async_trait]
impl<S: HistorySource> HistorySource for CachedHistory<S> {
    async fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, FetchError> {
        let key = CacheKey {
            symbol: symbol.to_string(),
            start,
            end,
        };
        if let Some(series) = self.cache.get(&key).await {
            debug!("Cache hit for {} [{}, {})", symbol, start, end);
            return Ok(series);
        }

        let series = self.source.fetch(symbol, start, end).await?;
        self.cache.put(key, series.clone()).await;
        Ok(series)
    }
}
