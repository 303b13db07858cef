use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A trending token as listed by the market API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub volume_24h: f64,
    /// Signed percentage, e.g. -85.0 for an 85% collapse
    pub volume_change_24h: f64,
    pub market_cap: f64,
    pub price_change_24h: f64,
}

/// Single-token view from the market API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDetails {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub volume_24h: f64,
    pub market_cap: f64,
    pub price_change_24h: f64,
    pub total_supply: Option<f64>,
    pub holders: Option<u64>,
}

/// Discrete severity of a volume anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// A token whose 24h volume collapsed past the detection threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyRecord {
    pub id: String,
    pub symbol: String,
    pub name: String,
    /// Estimated pre-drop volume. `None` when the drop is total (-100% or worse).
    pub normal_volume: Option<f64>,
    pub current_volume: f64,
    /// Absolute value of the volume change percentage
    pub percentage_change: f64,
    pub detected_at: DateTime<Utc>,
    pub severity: Severity,
    /// Heuristic score in [0, 100]
    pub rug_probability: f64,
}

/// Liquidation status tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidationStatus {
    #[serde(rename = "At Risk")]
    AtRisk,
    Critical,
}

impl std::fmt::Display for LiquidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LiquidationStatus::AtRisk => write!(f, "At Risk"),
            LiquidationStatus::Critical => write!(f, "Critical"),
        }
    }
}

/// A tracked wallet whose balance fell below 10% of its last snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidationRecord {
    pub address: String,
    pub liquidation_date: DateTime<Utc>,
    pub assets_lost: f64,
    pub loss_percentage: f64,
    pub last_active: DateTime<Utc>,
    pub status: LiquidationStatus,
}

/// Account summary from the blockchain API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletInfo {
    pub address: String,
    /// Balance in SOL
    pub balance: f64,
    pub last_active: DateTime<Utc>,
    pub risk_score: u8,
    pub is_tracked: bool,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Swap,
    Transfer,
    Nft,
    Unknown,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Swap => write!(f, "swap"),
            TransactionType::Transfer => write!(f, "transfer"),
            TransactionType::Nft => write!(f, "nft"),
            TransactionType::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    pub signature: String,
    pub block_time: i64,
    pub slot: u64,
    /// Fee in SOL
    pub fee: f64,
    pub status: TransactionStatus,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub token_amount: Option<f64>,
    pub token_symbol: Option<String>,
    pub usd_value: Option<f64>,
    pub counterparty: Option<String>,
    pub program_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenHolding {
    pub mint: String,
    pub symbol: String,
    pub name: String,
    pub amount: f64,
    pub usd_value: f64,
    pub price_change_24h: f64,
}

/// Everything known about one account, as served to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBundle {
    pub wallet: WalletInfo,
    pub transactions: Vec<WalletTransaction>,
    pub tokens: Vec<TokenHolding>,
    /// Always read from the tracked set, never from cache
    pub is_tracked: bool,
}

/// A post from the social feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author: String,
    pub author_handle: String,
    pub content: String,
    pub timestamp: String,
    pub likes: u64,
    pub reposts: u64,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
}

/// A raw trend as reported by the social feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendTopic {
    pub name: String,
    pub url: String,
    pub query: String,
    pub tweet_volume: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashtagCount {
    pub hashtag: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionCount {
    pub mention: String,
    pub count: u64,
}

/// A topic summary derived from social activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSummary {
    pub topic: String,
    pub tweet_count: u64,
    pub change_24h: i64,
    pub sentiment: Sentiment,
    pub last_updated: DateTime<Utc>,
}

/// Aggregated social feed view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialData {
    pub tweets: Vec<Post>,
    pub hashtags: Vec<HashtagCount>,
    pub mentions: Vec<MentionCount>,
    pub topics: Vec<TopicSummary>,
}
