//! Alert cooldown for liquidation notices.
//!
//! Detection passes may report the same liquidation more than once (overlapping
//! passes, or a cached list read twice). The cooldown deduplicates alerts by
//! address and calendar day with an atomic set-if-absent carrying a TTL.

use std::sync::Arc;
use std::time::Duration;

use rugradar_common::error::AppError;
use rugradar_common::store::KeyValueStore;
use rugradar_common::types::LiquidationRecord;

/// How long an alert marker lives (one day).
const DEFAULT_COOLDOWN: Duration = Duration::from_secs(24 * 60 * 60);

/// Store-backed once-per-day gate for liquidation alerts.
pub struct CooldownEngine {
    store: Arc<dyn KeyValueStore>,
    cooldown: Duration,
}

impl CooldownEngine {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_cooldown(store, DEFAULT_COOLDOWN)
    }

    pub fn with_cooldown(store: Arc<dyn KeyValueStore>, cooldown: Duration) -> Self {
        Self { store, cooldown }
    }

    fn key(record: &LiquidationRecord) -> String {
        format!(
            "liquidation:alerted:{}:{}",
            record.address,
            record.liquidation_date.format("%Y-%m-%d")
        )
    }

    /// Claim the alert for this record.
    ///
    /// Returns `true` if the alert should go out, `false` if one was already
    /// sent for the same address today.
    pub async fn check_and_set(&self, record: &LiquidationRecord) -> Result<bool, AppError> {
        let key = Self::key(record);
        let allowed = self.store.set_nx(&key, "1", Some(self.cooldown)).await?;

        if !allowed {
            tracing::debug!(
                address = %record.address,
                cooldown_secs = self.cooldown.as_secs(),
                "Liquidation alert suppressed, already sent today"
            );
        }
        Ok(allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use rugradar_common::store::MemoryStore;
    use rugradar_common::types::LiquidationStatus;

    fn record(address: &str, day: u32) -> LiquidationRecord {
        let at = Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap();
        LiquidationRecord {
            address: address.to_string(),
            liquidation_date: at,
            assets_lost: 95.0,
            loss_percentage: 95.0,
            last_active: at,
            status: LiquidationStatus::AtRisk,
        }
    }

    #[test]
    fn test_key_is_per_address_and_day() {
        assert_eq!(
            CooldownEngine::key(&record("W1", 3)),
            "liquidation:alerted:W1:2024-05-03"
        );
    }

    #[tokio::test]
    async fn test_second_alert_same_day_is_suppressed() {
        let cooldown = CooldownEngine::new(Arc::new(MemoryStore::new()));

        assert!(cooldown.check_and_set(&record("W1", 3)).await.unwrap());
        assert!(!cooldown.check_and_set(&record("W1", 3)).await.unwrap());
        // different address or different day is a new alert
        assert!(cooldown.check_and_set(&record("W2", 3)).await.unwrap());
        assert!(cooldown.check_and_set(&record("W1", 4)).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_expires() {
        let cooldown =
            CooldownEngine::with_cooldown(Arc::new(MemoryStore::new()), Duration::from_secs(60));

        assert!(cooldown.check_and_set(&record("W1", 3)).await.unwrap());
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cooldown.check_and_set(&record("W1", 3)).await.unwrap());
    }
}
