//! Blockchain account API client.
//!
//! Balances come back in lamports and are converted to SOL here. The risk score
//! and transaction type are placeholder heuristics, kept deterministic so the
//! rest of the system stays testable.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use rugradar_common::error::AppError;
use rugradar_common::types::{
    TokenHolding, TransactionStatus, TransactionType, WalletInfo, WalletTransaction,
};

use crate::{AccountDataSource, base_url, http_client, read_json};

pub const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

/// The system program; plain SOL transfers go through it.
pub const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";

#[derive(Debug, Clone, Deserialize)]
pub struct WireAccount {
    #[serde(default)]
    pub lamports: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTransaction {
    pub tx_hash: String,
    #[serde(default)]
    pub block_time: i64,
    #[serde(default)]
    pub slot: u64,
    #[serde(default)]
    pub fee: u64,
    #[serde(default)]
    pub status: String,
    pub token_amount: Option<f64>,
    pub token_symbol: Option<String>,
    pub usd_value: Option<f64>,
    pub counterparty: Option<String>,
    #[serde(default)]
    pub program_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUiAmount {
    #[serde(default)]
    pub ui_amount: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTokenAccount {
    pub token_address: String,
    pub token_symbol: Option<String>,
    pub token_name: Option<String>,
    pub token_amount: WireUiAmount,
    pub price_usdt: Option<f64>,
    pub price_change_24h: Option<f64>,
}

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL
}

/// Placeholder risk score in [30, 90]: larger balances score lower.
///
/// `90 - 15 * log10(balance + 1)`, clamped and rounded. Stands in for a real
/// model and is deliberately a pure function of the balance.
pub fn placeholder_risk_score(balance_sol: f64) -> u8 {
    let balance = if balance_sol.is_finite() { balance_sol.max(0.0) } else { 0.0 };
    (90.0 - 15.0 * (balance + 1.0).log10()).clamp(30.0, 90.0).round() as u8
}

/// Placeholder transaction classification from the fields the API exposes.
pub fn infer_transaction_type(token_symbol: Option<&str>, program_id: &str) -> TransactionType {
    if token_symbol.is_some_and(|s| !s.is_empty()) {
        TransactionType::Swap
    } else if program_id == SYSTEM_PROGRAM_ID {
        TransactionType::Transfer
    } else if program_id.contains("metaplex") {
        TransactionType::Nft
    } else {
        TransactionType::Unknown
    }
}

pub fn wallet_info_from_wire(address: &str, account: &WireAccount, now: DateTime<Utc>) -> WalletInfo {
    let balance = lamports_to_sol(account.lamports);
    WalletInfo {
        address: address.to_string(),
        balance,
        last_active: now,
        risk_score: placeholder_risk_score(balance),
        is_tracked: false,
        last_updated: now,
    }
}

impl From<WireTransaction> for WalletTransaction {
    fn from(tx: WireTransaction) -> Self {
        let tx_type = infer_transaction_type(tx.token_symbol.as_deref(), &tx.program_id);
        WalletTransaction {
            signature: tx.tx_hash,
            block_time: tx.block_time,
            slot: tx.slot,
            fee: lamports_to_sol(tx.fee),
            status: if tx.status == "Success" {
                TransactionStatus::Success
            } else {
                TransactionStatus::Failed
            },
            tx_type,
            token_amount: tx.token_amount,
            token_symbol: tx.token_symbol,
            usd_value: tx.usd_value,
            counterparty: tx.counterparty,
            program_id: tx.program_id,
        }
    }
}

impl From<WireTokenAccount> for TokenHolding {
    fn from(token: WireTokenAccount) -> Self {
        let amount = token.token_amount.ui_amount;
        TokenHolding {
            mint: token.token_address,
            symbol: token.token_symbol.unwrap_or_else(|| "Unknown".to_string()),
            name: token.token_name.unwrap_or_else(|| "Unknown Token".to_string()),
            amount,
            usd_value: amount * token.price_usdt.unwrap_or(0.0),
            price_change_24h: token.price_change_24h.unwrap_or(0.0),
        }
    }
}

/// HTTP client for the blockchain account API.
pub struct AccountClient {
    http: reqwest::Client,
    base_url: String,
}

impl AccountClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: base_url(base),
        })
    }
}

#[async_trait]
impl AccountDataSource for AccountClient {
    async fn account_info(&self, address: &str) -> Result<WalletInfo, AppError> {
        let response = self
            .http
            .get(format!("{}/account/{}", self.base_url, address))
            .send()
            .await?;
        let account: WireAccount = read_json(response, &format!("account {}", address)).await?;
        Ok(wallet_info_from_wire(address, &account, Utc::now()))
    }

    async fn transactions(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<WalletTransaction>, AppError> {
        let response = self
            .http
            .get(format!("{}/account/transactions", self.base_url))
            .query(&[("account", address.to_string()), ("limit", limit.to_string())])
            .send()
            .await?;
        let txs: Vec<WireTransaction> =
            read_json(response, &format!("transactions for {}", address)).await?;
        Ok(txs.into_iter().map(WalletTransaction::from).collect())
    }

    async fn token_holdings(&self, address: &str) -> Result<Vec<TokenHolding>, AppError> {
        let response = self
            .http
            .get(format!("{}/account/tokens", self.base_url))
            .query(&[("account", address)])
            .send()
            .await?;
        let tokens: Vec<WireTokenAccount> =
            read_json(response, &format!("tokens for {}", address)).await?;
        Ok(tokens.into_iter().map(TokenHolding::from).collect())
    }
}
