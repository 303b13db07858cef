//! Radar service facade.
//!
//! Wires the cache layer, the upstream sources and the detectors together and
//! exposes the operations a surface (HTTP routes, the watcher) calls. Every
//! upstream-derived read goes through [`CacheLayer::get_or_compute`]; tracking
//! mutations bypass the cache and invalidate the liquidation list.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use rugradar_clients::{AccountDataSource, MarketDataSource, SocialDataSource};
use rugradar_common::error::AppError;
use rugradar_common::store::KeyValueStore;
use rugradar_common::types::{
    AnomalyRecord, LiquidationRecord, SocialData, TokenDetails, TokenHolding, TokenRecord,
    TopicSummary, WalletBundle, WalletInfo, WalletTransaction,
};

use crate::anomaly::AnomalyDetector;
use crate::cache::{ANALYTICS_TTL, CacheLayer, LISTING_TTL, keys};
use crate::social::SocialAnalyzer;
use crate::tracker::WalletTracker;

pub const MAX_LISTING_LIMIT: usize = 100;

/// Transactions included in a wallet bundle.
pub const BUNDLE_TRANSACTIONS: usize = 10;

/// The cached part of a wallet bundle. Tracking status is not cached.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedWallet {
    wallet: WalletInfo,
    transactions: Vec<WalletTransaction>,
    tokens: Vec<TokenHolding>,
}

pub struct RadarService {
    cache: CacheLayer,
    store: Arc<dyn KeyValueStore>,
    market: Arc<dyn MarketDataSource>,
    accounts: Arc<dyn AccountDataSource>,
    anomalies: AnomalyDetector,
    tracker: WalletTracker,
    social: SocialAnalyzer,
}

impl RadarService {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        market: Arc<dyn MarketDataSource>,
        accounts: Arc<dyn AccountDataSource>,
        social: Arc<dyn SocialDataSource>,
    ) -> Self {
        Self {
            cache: CacheLayer::new(store.clone()),
            anomalies: AnomalyDetector::new(market.clone()),
            tracker: WalletTracker::new(store.clone(), accounts.clone()),
            social: SocialAnalyzer::new(social),
            store,
            market,
            accounts,
        }
    }

    pub fn tracker(&self) -> &WalletTracker {
        &self.tracker
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend_name()
    }

    pub async fn trending_tokens(&self, limit: usize) -> Result<Vec<TokenRecord>, AppError> {
        if limit == 0 || limit > MAX_LISTING_LIMIT {
            return Err(AppError::InvalidInput(format!(
                "limit must be between 1 and {}, got {}",
                MAX_LISTING_LIMIT, limit
            )));
        }

        self.cache
            .get_or_compute(&keys::trending_tokens(limit), LISTING_TTL, || {
                self.market.trending_tokens(limit)
            })
            .await
    }

    pub async fn token_info(&self, symbol: &str) -> Result<TokenDetails, AppError> {
        let symbol = require("token symbol", symbol)?;

        self.cache
            .get_or_compute(&keys::token(symbol), LISTING_TTL, || {
                self.market.token_info(symbol)
            })
            .await
    }

    pub async fn detect_anomalies(&self, threshold: f64) -> Result<Vec<AnomalyRecord>, AppError> {
        AnomalyDetector::validate_threshold(threshold)?;

        self.cache
            .get_or_compute(&keys::anomalies(threshold), ANALYTICS_TTL, || {
                self.anomalies.detect(threshold)
            })
            .await
    }

    /// Account info, recent transactions and holdings for `address`.
    ///
    /// The three lookups run concurrently and any failure fails the bundle.
    /// `is_tracked` is read from the tracked set on every call.
    pub async fn wallet_bundle(&self, address: &str) -> Result<WalletBundle, AppError> {
        let address = require("wallet address", address)?;

        let cached: CachedWallet = self
            .cache
            .get_or_compute(&keys::wallet_bundle(address), LISTING_TTL, || async {
                let (wallet, transactions, tokens) = tokio::try_join!(
                    self.accounts.account_info(address),
                    self.accounts.transactions(address, BUNDLE_TRANSACTIONS),
                    self.accounts.token_holdings(address),
                )?;
                Ok(CachedWallet {
                    wallet,
                    transactions,
                    tokens,
                })
            })
            .await?;

        let is_tracked = self.tracker.is_tracked(address).await?;
        let mut wallet = cached.wallet;
        wallet.is_tracked = is_tracked;

        Ok(WalletBundle {
            wallet,
            transactions: cached.transactions,
            tokens: cached.tokens,
            is_tracked,
        })
    }

    pub async fn track_wallet(&self, address: &str) -> Result<WalletInfo, AppError> {
        let info = self.tracker.track(require("wallet address", address)?).await?;
        self.invalidate_liquidations().await;
        Ok(info)
    }

    pub async fn untrack_wallet(&self, address: &str) -> Result<bool, AppError> {
        let removed = self.tracker.untrack(require("wallet address", address)?).await?;
        self.invalidate_liquidations().await;
        Ok(removed)
    }

    /// Liquidations over the tracked set. Balances inside a pass are always live.
    pub async fn liquidated_wallets(&self) -> Result<Vec<LiquidationRecord>, AppError> {
        self.cache
            .get_or_compute(keys::LIQUIDATED_WALLETS, ANALYTICS_TTL, || {
                self.tracker.detect_liquidations()
            })
            .await
    }

    pub async fn social_data(&self) -> Result<SocialData, AppError> {
        self.cache
            .get_or_compute(keys::SOCIAL_DATA, LISTING_TTL, || self.social.social_data())
            .await
    }

    pub async fn trending_topics(&self) -> Result<Vec<TopicSummary>, AppError> {
        self.cache
            .get_or_compute(keys::TRENDING_TOPICS, ANALYTICS_TTL, || {
                self.social.trending_topics()
            })
            .await
    }

    async fn invalidate_liquidations(&self) {
        if let Err(e) = self.cache.invalidate(keys::LIQUIDATED_WALLETS).await {
            tracing::warn!(error = %e, "Failed to invalidate cached liquidations");
        }
    }
}

fn require<'a>(what: &str, value: &'a str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(format!("{} must not be empty", what)));
    }
    Ok(trimmed)
}
