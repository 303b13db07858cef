pub mod account;
pub mod market;
pub mod social;

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use rugradar_common::error::AppError;
use rugradar_common::types::{
    Post, TokenDetails, TokenHolding, TokenRecord, TrendTopic, WalletInfo, WalletTransaction,
};

/// Token market API: trending listings and single-token lookups.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn trending_tokens(&self, limit: usize) -> Result<Vec<TokenRecord>, AppError>;

    async fn token_info(&self, symbol: &str) -> Result<TokenDetails, AppError>;
}

/// Blockchain account API: balances, history and holdings by address.
#[async_trait]
pub trait AccountDataSource: Send + Sync {
    async fn account_info(&self, address: &str) -> Result<WalletInfo, AppError>;

    async fn transactions(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<WalletTransaction>, AppError>;

    async fn token_holdings(&self, address: &str) -> Result<Vec<TokenHolding>, AppError>;
}

/// Social feed API: post search and trending topics.
#[async_trait]
pub trait SocialDataSource: Send + Sync {
    async fn search_posts(&self, query: &str, count: usize) -> Result<Vec<Post>, AppError>;

    async fn trending_topics(&self, woeid: u32) -> Result<Vec<TrendTopic>, AppError>;
}

/// Build the HTTP client shared by an upstream client.
///
/// Every request inherits `timeout`, so no upstream call can block indefinitely.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("rugradar/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {}", e)))
}

/// Check the status of an upstream response and decode its JSON body.
///
/// 404 becomes `NotFound(what)`; any other non-2xx status, a transport error or
/// an undecodable body becomes `UpstreamUnavailable`.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    what: &str,
) -> Result<T, AppError> {
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(AppError::NotFound(what.to_string()));
    }
    if !status.is_success() {
        return Err(AppError::UpstreamUnavailable(format!(
            "{} request returned {}",
            what, status
        )));
    }

    response.json::<T>().await.map_err(|e| {
        AppError::UpstreamUnavailable(format!("{} response could not be decoded: {}", what, e))
    })
}

/// Trim the trailing slash off a configured base URL.
pub(crate) fn base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trims_slash() {
        assert_eq!(base_url("https://api.pump.fun/"), "https://api.pump.fun");
        assert_eq!(base_url("https://api.pump.fun"), "https://api.pump.fun");
    }

    #[test]
    fn test_http_client_builds() {
        assert!(http_client(Duration::from_secs(5)).is_ok());
    }
}
