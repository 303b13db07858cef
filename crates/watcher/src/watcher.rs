use std::sync::Arc;
use std::time::Duration;

use rugradar_engine::cooldown::CooldownEngine;
use rugradar_engine::service::RadarService;

/// What one watcher tick observed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickSummary {
    pub liquidations: usize,
    pub alerted: usize,
    pub suppressed: usize,
    pub failures: usize,
    pub anomalies: usize,
}

/// Timer-driven detection loop over the radar service.
///
/// Each tick runs a live liquidation pass and an anomaly scan. Both are the
/// same calls an on-demand caller would make.
pub struct Watcher {
    service: Arc<RadarService>,
    cooldown: CooldownEngine,
    interval: Duration,
    anomaly_threshold: f64,
}

impl Watcher {
    pub fn new(
        service: Arc<RadarService>,
        cooldown: CooldownEngine,
        interval_secs: u64,
        anomaly_threshold: f64,
    ) -> Self {
        Self {
            service,
            cooldown,
            interval: Duration::from_secs(interval_secs.max(1)),
            anomaly_threshold,
        }
    }

    /// Start tracking the configured wallets. Failures are logged, not fatal.
    pub async fn seed(&self, wallets: &[String]) -> usize {
        let mut seeded = 0;
        for address in wallets {
            match self.service.track_wallet(address).await {
                Ok(info) => {
                    seeded += 1;
                    tracing::info!(address = %address, balance = info.balance, "Seeded watched wallet");
                }
                Err(e) => {
                    tracing::warn!(address = %address, error = %e, "Failed to seed watched wallet");
                }
            }
        }
        seeded
    }

    /// Run ticks forever, one per interval. The first tick fires immediately.
    pub async fn run(&self) -> anyhow::Result<()> {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            anomaly_threshold = self.anomaly_threshold,
            store = self.service.store_backend(),
            "Watcher started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    pub async fn tick(&self) -> TickSummary {
        let mut summary = TickSummary::default();

        match self.service.tracker().run_pass().await {
            Ok(pass) => {
                summary.liquidations = pass.liquidated.len();
                summary.failures = pass.failures.len();

                for record in &pass.liquidated {
                    let allowed = match self.cooldown.check_and_set(record).await {
                        Ok(allowed) => allowed,
                        Err(e) => {
                            tracing::warn!(address = %record.address, error = %e, "Cooldown check failed");
                            true
                        }
                    };

                    if allowed {
                        summary.alerted += 1;
                        tracing::warn!(
                            address = %record.address,
                            assets_lost = record.assets_lost,
                            loss_pct = record.loss_percentage,
                            status = %record.status,
                            "Wallet liquidated"
                        );
                    } else {
                        summary.suppressed += 1;
                    }
                }

                for failure in &pass.failures {
                    tracing::warn!(
                        address = %failure.address,
                        kind = failure.error.kind,
                        message = %failure.error.message,
                        "Wallet could not be checked"
                    );
                }
            }
            Err(e) => tracing::error!(error = %e, "Liquidation pass failed"),
        }

        match self.service.detect_anomalies(self.anomaly_threshold).await {
            Ok(anomalies) => {
                summary.anomalies = anomalies.len();
                for anomaly in &anomalies {
                    tracing::info!(
                        symbol = %anomaly.symbol,
                        change_pct = anomaly.percentage_change,
                        severity = %anomaly.severity,
                        rug_probability = anomaly.rug_probability,
                        "Volume anomaly"
                    );
                }
            }
            Err(e) => tracing::error!(error = %e, "Anomaly detection failed"),
        }

        tracing::info!(
            liquidations = summary.liquidations,
            alerted = summary.alerted,
            suppressed = summary.suppressed,
            failures = summary.failures,
            anomalies = summary.anomalies,
            "Watcher tick complete"
        );
        summary
    }
}
