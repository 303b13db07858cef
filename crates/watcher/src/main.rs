use std::sync::Arc;
use std::time::Duration;

use rugradar_clients::account::AccountClient;
use rugradar_clients::market::MarketClient;
use rugradar_clients::social::SocialClient;
use rugradar_common::config::AppConfig;
use rugradar_common::redis_pool;
use rugradar_engine::cooldown::CooldownEngine;
use rugradar_engine::service::RadarService;
use rugradar_watcher::watcher::Watcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "rugradar_watcher=info,rugradar_engine=info,rugradar_common=info".into()
            }),
        )
        .json()
        .init();

    tracing::info!("RugRadar watcher starting...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Durable store, or the in-process fallback
    let store = redis_pool::select_store(&config).await;

    let timeout = Duration::from_secs(config.http_timeout_secs);
    let market = MarketClient::new(&config.market_api_url, config.market_api_key.clone(), timeout)?;
    let accounts = AccountClient::new(&config.account_api_url, timeout)?;
    let social = SocialClient::new(
        &config.social_api_url,
        config.social_bearer_token.clone(),
        timeout,
    )?;

    let service = Arc::new(RadarService::new(
        store.clone(),
        Arc::new(market),
        Arc::new(accounts),
        Arc::new(social),
    ));
    let watcher = Watcher::new(
        service,
        CooldownEngine::new(store),
        config.watcher_interval_secs,
        config.anomaly_threshold,
    );

    if !config.watch_wallets.is_empty() {
        let seeded = watcher.seed(&config.watch_wallets).await;
        tracing::info!(
            configured = config.watch_wallets.len(),
            seeded,
            "Watched wallets seeded"
        );
    }

    // Run with graceful shutdown on Ctrl+C
    tokio::select! {
        result = watcher.run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Watcher exited with error");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping gracefully...");
        }
    }

    tracing::info!("RugRadar watcher stopped.");
    Ok(())
}
