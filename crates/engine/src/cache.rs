//! Read-through cache over the key-value store.
//!
//! Every externally derived resource goes through `get_or_compute`: a hit is
//! deserialized and returned, a miss is computed, written with the resource's
//! fixed TTL and returned. Failed computations are never written.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use rugradar_common::error::AppError;
use rugradar_common::store::KeyValueStore;

/// TTL for listings and single-entity resources (15 minutes).
pub const LISTING_TTL: Duration = Duration::from_secs(15 * 60);

/// TTL for derived analytics (30 minutes).
pub const ANALYTICS_TTL: Duration = Duration::from_secs(30 * 60);

/// Cache key builders, one per cached resource.
pub mod keys {
    pub const LIQUIDATED_WALLETS: &str = "wallets:liquidated";
    pub const SOCIAL_DATA: &str = "twitter:data";
    pub const TRENDING_TOPICS: &str = "twitter:topics";

    pub fn trending_tokens(limit: usize) -> String {
        format!("pumpfun:trending:{}", limit)
    }

    pub fn token(symbol: &str) -> String {
        format!("pumpfun:token:{}", symbol)
    }

    pub fn anomalies(threshold: f64) -> String {
        format!("pumpfun:anomalies:{}", threshold)
    }

    pub fn wallet_bundle(address: &str) -> String {
        format!("wallet:{}:data", address)
    }
}

/// Read-through, write-through cache layer.
#[derive(Clone)]
pub struct CacheLayer {
    store: Arc<dyn KeyValueStore>,
}

impl CacheLayer {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Return the cached value for `key`, or compute, cache and return it.
    ///
    /// The cache is best-effort: an undecodable entry counts as a miss, and store
    /// errors only cost the caching. Errors from `compute` always propagate and
    /// leave the cache untouched. The value is written with a single `set`, so
    /// readers see the old entry or the complete new one.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        match self.store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    tracing::debug!(key, "Cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "Discarding undecodable cache entry");
                }
            },
            Ok(None) => tracing::debug!(key, "Cache miss"),
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache read failed, computing uncached");
            }
        }

        let value = compute().await?;

        match serde_json::to_string(&value) {
            Ok(raw) => {
                if let Err(e) = self.store.set(key, &raw, Some(ttl)).await {
                    tracing::warn!(key, error = %e, "Cache write failed");
                } else {
                    tracing::debug!(key, ttl_secs = ttl.as_secs(), "Cached value");
                }
            }
            Err(e) => tracing::warn!(key, error = %e, "Value could not be serialized for caching"),
        }

        Ok(value)
    }

    /// Drop a cached entry so the next read recomputes it.
    pub async fn invalidate(&self, key: &str) -> Result<(), AppError> {
        self.store.del(key).await?;
        Ok(())
    }
}
