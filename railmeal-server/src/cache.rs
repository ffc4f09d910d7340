//! Caching layer for timetable lookups.
//!
//! The timetable is static reference data, and every eligibility check and
//! restaurant listing starts with a route lookup, so route results are cached
//! with a TTL. Restaurant, holiday and menu data change during the day and
//! are always read through.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;

use crate::domain::{
    HolidayWindow, MenuItem, Restaurant, RestaurantCode, RouteStop, StationCode, TrainNumber,
};
use crate::store::{DataStore, NewOrder, OrderId, StatusEntry, StoreError};

/// Cache key for route lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum RouteKey {
    Number(TrainNumber),
    /// Lowercased, trimmed search text.
    Text(String),
}

/// Cached route entry.
type RouteEntry = Arc<Vec<RouteStop>>;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(15 * 60),
            max_capacity: 2000,
        }
    }
}

impl CacheConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_capacity(mut self, n: u64) -> Self {
        self.max_capacity = n;
        self
    }
}

/// Store wrapper that caches route lookups.
pub struct CachedStore<S> {
    inner: S,
    routes: MokaCache<RouteKey, RouteEntry>,
}

impl<S: DataStore> CachedStore<S> {
    /// Create a new cached store.
    pub fn new(inner: S, config: &CacheConfig) -> Self {
        let routes = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { inner, routes }
    }

    /// Access the underlying store for operations that bypass cache.
    /// Invalidate all cached entries.
    pub fn invalidate_cache(&self) {
        self.routes.invalidate_all();
    }

    async fn cached_route<F>(&self, key: RouteKey, fetch: F) -> Result<Vec<RouteStop>, StoreError>
    where
        F: Future<Output = Result<Vec<RouteStop>, StoreError>>,
    {
        if let Some(cached) = self.routes.get(&key).await {
            return Ok(cached.as_ref().clone());
        }

        let stops = fetch.await?;
        self.routes.insert(key, Arc::new(stops.clone())).await;
        Ok(stops)
    }
}

impl<S: DataStore> DataStore for CachedStore<S> {
    async fn route_by_number(&self, number: TrainNumber) -> Result<Vec<RouteStop>, StoreError> {
        self.cached_route(RouteKey::Number(number), self.inner.route_by_number(number))
            .await
    }

    async fn route_matching(&self, text: &str) -> Result<Vec<RouteStop>, StoreError> {
        let key = RouteKey::Text(text.trim().to_lowercase());
        self.cached_route(key, self.inner.route_matching(text)).await
    }

    async fn restaurants_at(&self, station: &StationCode) -> Result<Vec<Restaurant>, StoreError> {
        self.inner.restaurants_at(station).await
    }

    async fn restaurant(&self, code: &RestaurantCode) -> Result<Option<Restaurant>, StoreError> {
        self.inner.restaurant(code).await
    }

    async fn active_holidays(&self, code: &RestaurantCode) -> Result<Vec<HolidayWindow>, StoreError> {
        self.inner.active_holidays(code).await
    }

    async fn menu_items(&self, code: &RestaurantCode) -> Result<Vec<MenuItem>, StoreError> {
        self.inner.menu_items(code).await
    }

    async fn insert_order(&self, order: &NewOrder) -> Result<OrderId, StoreError> {
        self.inner.insert_order(order).await
    }

    async fn insert_status(&self, entry: &StatusEntry) -> Result<(), StoreError> {
        self.inner.insert_status(entry).await
    }
}
