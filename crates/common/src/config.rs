use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Redis connection string. When absent the in-process store is used.
    pub redis_url: Option<String>,

    /// How long to wait for Redis at startup before falling back (default: 3000)
    pub redis_connect_timeout_ms: u64,

    /// Token market API base URL
    pub market_api_url: String,

    /// Token market API key, sent as `X-API-KEY`
    pub market_api_key: Option<String>,

    /// Blockchain account API base URL
    pub account_api_url: String,

    /// Social feed API base URL
    pub social_api_url: String,

    /// Pre-issued bearer token for the social feed API
    pub social_bearer_token: Option<String>,

    /// Timeout applied to every upstream HTTP call, in seconds (default: 10)
    pub http_timeout_secs: u64,

    /// Interval between watcher detection passes, in seconds (default: 300)
    pub watcher_interval_secs: u64,

    /// Volume drop percentage that counts as an anomaly (default: 50)
    pub anomaly_threshold: f64,

    /// Wallets the watcher starts tracking at boot
    pub watch_wallets: Vec<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            redis_url: std::env::var("REDIS_URL")
                .or_else(|_| std::env::var("KV_URL"))
                .ok()
                .filter(|url| !url.trim().is_empty()),
            redis_connect_timeout_ms: std::env::var("REDIS_CONNECT_TIMEOUT_MS")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("REDIS_CONNECT_TIMEOUT_MS must be a valid u64"))?,
            market_api_url: std::env::var("MARKET_API_URL")
                .unwrap_or_else(|_| "https://api.pump.fun".to_string()),
            market_api_key: std::env::var("MARKET_API_KEY")
                .or_else(|_| std::env::var("X_API_KEY"))
                .ok(),
            account_api_url: std::env::var("ACCOUNT_API_URL")
                .unwrap_or_else(|_| "https://public-api.solscan.io".to_string()),
            social_api_url: std::env::var("SOCIAL_API_URL")
                .unwrap_or_else(|_| "https://api.twitter.com".to_string()),
            social_bearer_token: std::env::var("SOCIAL_BEARER_TOKEN").ok(),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("HTTP_TIMEOUT_SECS must be a valid u64"))?,
            watcher_interval_secs: std::env::var("WATCHER_INTERVAL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("WATCHER_INTERVAL_SECS must be a valid u64"))?,
            anomaly_threshold: std::env::var("ANOMALY_THRESHOLD")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("ANOMALY_THRESHOLD must be a valid number"))?,
            watch_wallets: parse_wallet_list(
                &std::env::var("WATCH_WALLETS").unwrap_or_default(),
            ),
        })
    }
}

/// Split a comma separated wallet list, dropping blanks and duplicates.
pub fn parse_wallet_list(raw: &str) -> Vec<String> {
    let mut wallets: Vec<String> = Vec::new();
    for wallet in raw.split(',').map(str::trim).filter(|w| !w.is_empty()) {
        if !wallets.iter().any(|w| w == wallet) {
            wallets.push(wallet.to_string());
        }
    }
    wallets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wallet_list() {
        let wallets = parse_wallet_list(" A1 , ,B2,A1,");
        assert_eq!(wallets, vec!["A1".to_string(), "B2".to_string()]);
    }

    #[test]
    fn test_parse_empty_wallet_list() {
        assert!(parse_wallet_list("").is_empty());
    }
}
