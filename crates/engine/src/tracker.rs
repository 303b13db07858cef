//! Tracked wallets and balance-drop ("liquidation") detection.
//!
//! Tracking an address stores a balance snapshot next to its membership in the
//! tracked set. A detection pass fetches every tracked balance live, compares it
//! to the snapshot and flags drops below 10% of it. The snapshot is then moved
//! to the observed balance, so each pass measures against the one before.
//!
//! Store layout:
//! - `tracked_wallets`: set of tracked addresses
//! - `wallet:{address}:balance`: last observed balance in SOL, no TTL

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use rugradar_clients::AccountDataSource;
use rugradar_common::error::{AppError, ErrorDescriptor};
use rugradar_common::store::KeyValueStore;
use rugradar_common::types::{LiquidationRecord, LiquidationStatus, WalletInfo};

pub const TRACKED_WALLETS_KEY: &str = "tracked_wallets";

/// A balance below this fraction of the snapshot is a liquidation.
pub const LIQUIDATION_RATIO: f64 = 0.1;

/// Loss percentage above which a liquidation is `Critical`.
pub const CRITICAL_LOSS_PCT: f64 = 95.0;

pub fn snapshot_key(address: &str) -> String {
    format!("wallet:{}:balance", address)
}

/// An address the pass could not evaluate, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassFailure {
    pub address: String,
    pub error: ErrorDescriptor,
}

/// Outcome of one detection pass over the tracked set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LiquidationPass {
    pub liquidated: Vec<LiquidationRecord>,
    /// Addresses whose balance was fetched and compared
    pub checked: usize,
    /// Tracked addresses without a snapshot
    pub skipped: usize,
    pub failures: Vec<PassFailure>,
}

enum Observation {
    Checked(Option<LiquidationRecord>),
    NoSnapshot,
}

/// Owns the tracked wallet set and the per-wallet balance snapshots.
pub struct WalletTracker {
    store: Arc<dyn KeyValueStore>,
    accounts: Arc<dyn AccountDataSource>,
}

impl WalletTracker {
    pub fn new(store: Arc<dyn KeyValueStore>, accounts: Arc<dyn AccountDataSource>) -> Self {
        Self { store, accounts }
    }

    /// Start tracking `address`, baselining its snapshot at the current balance.
    ///
    /// Tracking an already tracked address re-baselines it. The snapshot is
    /// written before the set membership and removed again if the membership
    /// write fails, so a failed track leaves neither behind.
    pub async fn track(&self, address: &str) -> Result<WalletInfo, AppError> {
        validate_address(address)?;

        let mut info = self.accounts.account_info(address).await?;
        let was_tracked = self.store.sismember(TRACKED_WALLETS_KEY, address).await?;
        self.store
            .set(&snapshot_key(address), &info.balance.to_string(), None)
            .await?;
        if let Err(e) = self
            .store
            .sadd(TRACKED_WALLETS_KEY, &[address.to_string()])
            .await
        {
            if !was_tracked {
                if let Err(cleanup) = self.store.del(&snapshot_key(address)).await {
                    tracing::error!(
                        address = %address,
                        error = %cleanup,
                        "Failed to remove snapshot of untracked wallet"
                    );
                }
            }
            return Err(e);
        }

        tracing::info!(address = %address, balance = info.balance, "Wallet tracked");
        info.is_tracked = true;
        Ok(info)
    }

    /// Stop tracking `address` and drop its snapshot.
    ///
    /// Returns whether the address was tracked.
    pub async fn untrack(&self, address: &str) -> Result<bool, AppError> {
        validate_address(address)?;

        let removed = self
            .store
            .srem(TRACKED_WALLETS_KEY, &[address.to_string()])
            .await?;
        self.store.del(&snapshot_key(address)).await?;

        tracing::info!(address = %address, was_tracked = removed > 0, "Wallet untracked");
        Ok(removed > 0)
    }

    pub async fn is_tracked(&self, address: &str) -> Result<bool, AppError> {
        self.store.sismember(TRACKED_WALLETS_KEY, address).await
    }

    /// Tracked addresses, sorted.
    pub async fn tracked_wallets(&self) -> Result<Vec<String>, AppError> {
        let mut wallets = self.store.smembers(TRACKED_WALLETS_KEY).await?;
        wallets.sort();
        Ok(wallets)
    }

    /// The stored snapshot for `address`, if any.
    pub async fn snapshot(&self, address: &str) -> Result<Option<f64>, AppError> {
        match self.store.get(&snapshot_key(address)).await? {
            Some(raw) => raw.trim().parse::<f64>().map(Some).map_err(|_| {
                AppError::Internal(format!(
                    "balance snapshot for {} is not a number: {:?}",
                    address, raw
                ))
            }),
            None => Ok(None),
        }
    }

    /// Run one detection pass over every tracked address.
    ///
    /// Addresses are evaluated independently: a failed fetch or a corrupt
    /// snapshot is recorded in `failures` and the pass moves on.
    pub async fn run_pass(&self) -> Result<LiquidationPass, AppError> {
        let wallets = self.tracked_wallets().await?;
        let mut pass = LiquidationPass::default();

        for address in &wallets {
            match self.observe(address).await {
                Ok(Observation::Checked(record)) => {
                    pass.checked += 1;
                    if let Some(record) = record {
                        pass.liquidated.push(record);
                    }
                }
                Ok(Observation::NoSnapshot) => {
                    tracing::debug!(address = %address, "No balance snapshot, skipping");
                    pass.skipped += 1;
                }
                Err(e) => {
                    if e.is_upstream() {
                        tracing::warn!(address = %address, error = %e, "Balance fetch failed, skipping wallet");
                    } else {
                        tracing::warn!(address = %address, error = %e, "Liquidation check failed on stored state");
                    }
                    pass.failures.push(PassFailure {
                        address: address.clone(),
                        error: e.descriptor(),
                    });
                }
            }
        }

        tracing::info!(
            tracked = wallets.len(),
            checked = pass.checked,
            skipped = pass.skipped,
            failed = pass.failures.len(),
            liquidated = pass.liquidated.len(),
            "Liquidation pass complete"
        );
        Ok(pass)
    }

    /// Liquidations found by a fresh pass.
    pub async fn detect_liquidations(&self) -> Result<Vec<LiquidationRecord>, AppError> {
        Ok(self.run_pass().await?.liquidated)
    }

    async fn observe(&self, address: &str) -> Result<Observation, AppError> {
        let Some(previous) = self.snapshot(address).await? else {
            return Ok(Observation::NoSnapshot);
        };

        let current = self.accounts.account_info(address).await?;
        let record = Self::evaluate(
            address,
            previous,
            current.balance,
            current.last_active,
            Utc::now(),
        );

        // An untrack that landed mid-check must not get its snapshot back
        if self.store.sismember(TRACKED_WALLETS_KEY, address).await? {
            self.store
                .set(&snapshot_key(address), &current.balance.to_string(), None)
                .await?;
        }

        if let Some(record) = &record {
            tracing::info!(
                address = %address,
                previous,
                current = current.balance,
                loss_pct = record.loss_percentage,
                status = %record.status,
                "Liquidation detected"
            );
        }
        Ok(Observation::Checked(record))
    }

    /// Compare a balance against its snapshot.
    ///
    /// Returns a record when `current < previous * 0.1`. A non-positive snapshot
    /// has no drop to measure.
    pub fn evaluate(
        address: &str,
        previous: f64,
        current: f64,
        last_active: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Option<LiquidationRecord> {
        if previous.is_nan() || previous <= 0.0 || current >= previous * LIQUIDATION_RATIO {
            return None;
        }

        let loss_percentage = (previous - current) * 100.0 / previous;
        let status = if loss_percentage > CRITICAL_LOSS_PCT {
            LiquidationStatus::Critical
        } else {
            LiquidationStatus::AtRisk
        };

        Some(LiquidationRecord {
            address: address.to_string(),
            liquidation_date: now,
            assets_lost: previous - current,
            loss_percentage,
            last_active,
            status,
        })
    }
}

fn validate_address(address: &str) -> Result<(), AppError> {
    if address.trim().is_empty() {
        return Err(AppError::InvalidInput("wallet address must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(previous: f64, current: f64) -> Option<LiquidationRecord> {
        let now = Utc::now();
        WalletTracker::evaluate("W", previous, current, now, now)
    }

    #[test]
    fn test_snapshot_key() {
        assert_eq!(snapshot_key("W1"), "wallet:W1:balance");
    }

    #[test]
    fn test_ninety_five_percent_loss_is_at_risk() {
        let record = check(100.0, 5.0).unwrap();
        assert_eq!(record.loss_percentage, 95.0);
        assert_eq!(record.assets_lost, 95.0);
        assert_eq!(record.status, LiquidationStatus::AtRisk);
    }

    #[test]
    fn test_ninety_nine_percent_loss_is_critical() {
        let record = check(100.0, 1.0).unwrap();
        assert_eq!(record.loss_percentage, 99.0);
        assert_eq!(record.status, LiquidationStatus::Critical);
    }

    #[test]
    fn test_ratio_boundary() {
        // exactly 10% of the snapshot is not a liquidation
        assert!(check(100.0, 10.0).is_none());
        assert!(check(100.0, 9.99).is_some());
        assert!(check(100.0, 15.0).is_none());
        assert!(check(100.0, 250.0).is_none());
    }

    #[test]
    fn test_total_loss() {
        let record = check(40.0, 0.0).unwrap();
        assert_eq!(record.loss_percentage, 100.0);
        assert_eq!(record.status, LiquidationStatus::Critical);
    }

    #[test]
    fn test_non_positive_snapshot_never_flags() {
        assert!(check(0.0, 0.0).is_none());
        assert!(check(-3.0, -10.0).is_none());
        assert!(check(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn test_validate_address() {
        assert!(validate_address("W1").is_ok());
        assert_eq!(validate_address("").unwrap_err().kind(), "invalid_input");
        assert_eq!(validate_address("   ").unwrap_err().kind(), "invalid_input");
    }
}
