//! Token market API client.
//!
//! Fetches trending listings and single tokens, and reshapes the wire payloads
//! into `TokenRecord` / `TokenDetails`. No state, no caching.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use rugradar_common::error::AppError;
use rugradar_common::types::{TokenDetails, TokenRecord};

use crate::{MarketDataSource, base_url, http_client, read_json};

/// Wire shape of a token in the market API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireToken {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub volume_24h: f64,
    #[serde(default)]
    pub volume_change_24h: f64,
    #[serde(default)]
    pub market_cap: f64,
    #[serde(default)]
    pub price_change_24h: f64,
    pub total_supply: Option<f64>,
    pub holders: Option<u64>,
}

impl From<WireToken> for TokenRecord {
    fn from(token: WireToken) -> Self {
        TokenRecord {
            symbol: token.symbol,
            name: token.name,
            price: token.price,
            volume_24h: token.volume_24h,
            volume_change_24h: token.volume_change_24h,
            market_cap: token.market_cap,
            price_change_24h: token.price_change_24h,
        }
    }
}

impl From<WireToken> for TokenDetails {
    fn from(token: WireToken) -> Self {
        TokenDetails {
            symbol: token.symbol,
            name: token.name,
            price: token.price,
            volume_24h: token.volume_24h,
            market_cap: token.market_cap,
            price_change_24h: token.price_change_24h,
            total_supply: token.total_supply,
            holders: token.holders,
        }
    }
}

/// HTTP client for the token market API.
pub struct MarketClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl MarketClient {
    pub fn new(base: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: base_url(base),
            api_key,
        })
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.get(format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => builder.header("X-API-KEY", key),
            None => builder,
        }
    }
}

#[async_trait]
impl MarketDataSource for MarketClient {
    async fn trending_tokens(&self, limit: usize) -> Result<Vec<TokenRecord>, AppError> {
        let response = self
            .request("/tokens/trending")
            .query(&[("limit", limit)])
            .send()
            .await?;
        let tokens: Vec<WireToken> = read_json(response, "trending tokens").await?;

        tracing::debug!(count = tokens.len(), limit, "Fetched trending tokens");
        Ok(tokens.into_iter().map(TokenRecord::from).collect())
    }

    async fn token_info(&self, symbol: &str) -> Result<TokenDetails, AppError> {
        let response = self.request(&format!("/tokens/{}", symbol)).send().await?;
        let token: WireToken = read_json(response, &format!("token {}", symbol)).await?;
        Ok(token.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trending_payload_to_records() {
        let payload = serde_json::json!([
            {
                "symbol": "BONK",
                "name": "Bonk",
                "price": 0.000021,
                "volume24h": 1500000.0,
                "volumeChange24h": -62.5,
                "marketCap": 1300000000.0,
                "priceChange24h": -4.1
            },
            { "symbol": "NEW" }
        ]);

        let wire: Vec<WireToken> = serde_json::from_value(payload).unwrap();
        let records: Vec<TokenRecord> = wire.into_iter().map(TokenRecord::from).collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].symbol, "BONK");
        assert_eq!(records[0].volume_24h, 1500000.0);
        assert_eq!(records[0].volume_change_24h, -62.5);
        // Missing numbers default to zero rather than failing the whole listing
        assert_eq!(records[1].volume_24h, 0.0);
        assert_eq!(records[1].name, "");
    }

    #[test]
    fn test_token_payload_to_details() {
        let payload = serde_json::json!({
            "symbol": "WIF",
            "name": "dogwifhat",
            "price": 2.31,
            "volume24h": 98000000.0,
            "marketCap": 2300000000.0,
            "priceChange24h": 3.2,
            "totalSupply": 998900000.0,
            "holders": 180000
        });

        let details: TokenDetails = serde_json::from_value::<WireToken>(payload).unwrap().into();
        assert_eq!(details.symbol, "WIF");
        assert_eq!(details.total_supply, Some(998900000.0));
        assert_eq!(details.holders, Some(180000));
    }

    #[test]
    fn test_client_trims_base_url() {
        let client = MarketClient::new("https://api.pump.fun/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url, "https://api.pump.fun");
    }
}
