use std::sync::Arc;
use std::time::Duration;

use redis::Client;
use redis::aio::ConnectionManager;

use crate::config::AppConfig;
use crate::store::{KeyValueStore, MemoryStore, RedisStore};

/// Create a Redis connection manager for async operations.
///
/// Fails if the server cannot be reached or does not answer `PING` within `timeout`.
pub async fn create_redis_pool(redis_url: &str, timeout: Duration) -> anyhow::Result<ConnectionManager> {
    let client = Client::open(redis_url)?;
    let mut manager = tokio::time::timeout(timeout, ConnectionManager::new(client))
        .await
        .map_err(|_| anyhow::anyhow!("timed out connecting to Redis"))??;

    let pong: String = tokio::time::timeout(timeout, redis::cmd("PING").query_async(&mut manager))
        .await
        .map_err(|_| anyhow::anyhow!("timed out waiting for Redis PING"))??;
    anyhow::ensure!(pong == "PONG", "unexpected PING reply: {}", pong);

    tracing::info!("Connected to Redis");
    Ok(manager)
}

/// Pick the store backend once at startup.
///
/// Redis is used when configured and reachable. Anything else falls back to the
/// in-process store, which behaves the same but loses its state on restart.
pub async fn select_store(config: &AppConfig) -> Arc<dyn KeyValueStore> {
    let timeout = Duration::from_millis(config.redis_connect_timeout_ms);

    let reason = match config.redis_url.as_deref() {
        Some(url) => match create_redis_pool(url, timeout).await {
            Ok(manager) => return Arc::new(RedisStore::new(manager)),
            Err(e) => format!("Redis unreachable: {}", e),
        },
        None => "no Redis configuration found".to_string(),
    };

    tracing::warn!(
        reason = %reason,
        "Using in-process fallback storage; state will not survive a restart"
    );
    Arc::new(MemoryStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(redis_url: Option<&str>) -> AppConfig {
        AppConfig {
            redis_url: redis_url.map(str::to_string),
            redis_connect_timeout_ms: 200,
            market_api_url: "http://unused".to_string(),
            market_api_key: None,
            account_api_url: "http://unused".to_string(),
            social_api_url: "http://unused".to_string(),
            social_bearer_token: None,
            http_timeout_secs: 1,
            watcher_interval_secs: 60,
            anomaly_threshold: 50.0,
            watch_wallets: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_missing_url_selects_memory() {
        let store = select_store(&config_with(None)).await;
        assert_eq!(store.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_malformed_url_selects_memory() {
        let store = select_store(&config_with(Some("not-a-redis-url"))).await;
        assert_eq!(store.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_unreachable_redis_selects_memory() {
        // Port 1 is reserved and never runs Redis
        let store = select_store(&config_with(Some("redis://127.0.0.1:1"))).await;
        assert_eq!(store.backend_name(), "memory");

        // The fallback is fully usable
        store.set("k", "v", None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
