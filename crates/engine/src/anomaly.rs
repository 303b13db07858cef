//! Volume anomaly detection over trending tokens.
//!
//! A token is anomalous when its 24h volume change is below `-threshold`.
//! Each hit gets a severity tier, a back-solved pre-drop volume and a heuristic
//! rug probability.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use rugradar_clients::MarketDataSource;
use rugradar_common::error::AppError;
use rugradar_common::types::{AnomalyRecord, Severity, TokenRecord};

/// Default volume drop (in percent) that counts as an anomaly.
pub const DEFAULT_THRESHOLD: f64 = 50.0;

/// How many trending tokens one detection run scans.
pub const SCAN_SIZE: usize = 50;

/// Flat bump added to the drop percentage in the rug probability heuristic.
const RUG_PROBABILITY_OFFSET: f64 = 20.0;

/// Detects tokens whose trading volume collapsed.
pub struct AnomalyDetector {
    market: Arc<dyn MarketDataSource>,
}

impl AnomalyDetector {
    pub fn new(market: Arc<dyn MarketDataSource>) -> Self {
        Self { market }
    }

    /// Fetch the current trending tokens and flag the anomalous ones.
    pub async fn detect(&self, threshold: f64) -> Result<Vec<AnomalyRecord>, AppError> {
        Self::validate_threshold(threshold)?;

        let tokens = self.market.trending_tokens(SCAN_SIZE).await?;
        let anomalies = Self::scan(&tokens, threshold, Utc::now());

        tracing::info!(
            scanned = tokens.len(),
            anomalies = anomalies.len(),
            threshold,
            "Volume anomaly scan complete"
        );
        Ok(anomalies)
    }

    /// Reject thresholds that cannot describe a percentage drop.
    pub fn validate_threshold(threshold: f64) -> Result<(), AppError> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(AppError::InvalidInput(format!(
                "threshold must be a non-negative number, got {}",
                threshold
            )));
        }
        Ok(())
    }

    /// Flag every token whose volume change is strictly below `-threshold`.
    ///
    /// Upstream order is preserved.
    pub fn scan(tokens: &[TokenRecord], threshold: f64, now: DateTime<Utc>) -> Vec<AnomalyRecord> {
        tokens
            .iter()
            .filter(|token| token.volume_change_24h < -threshold)
            .map(|token| {
                let change = token.volume_change_24h;
                AnomalyRecord {
                    id: format!("anomaly-{}", token.symbol),
                    symbol: token.symbol.clone(),
                    name: token.name.clone(),
                    normal_volume: Self::normal_volume(token.volume_24h, change),
                    current_volume: token.volume_24h,
                    percentage_change: change.abs(),
                    detected_at: now,
                    severity: Self::severity_for(change),
                    rug_probability: Self::rug_probability(change),
                }
            })
            .collect()
    }

    /// Severity tier for a signed change percentage, most negative first.
    pub fn severity_for(change_pct: f64) -> Severity {
        if change_pct < -80.0 {
            Severity::Critical
        } else if change_pct < -70.0 {
            Severity::High
        } else if change_pct < -60.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Back-solve the pre-drop volume from `current = normal * (1 + change/100)`.
    ///
    /// A drop of 100% or more leaves nothing to solve from, so the result is
    /// `None` rather than an infinite or negative volume.
    pub fn normal_volume(current_volume: f64, change_pct: f64) -> Option<f64> {
        let factor = 1.0 + change_pct / 100.0;
        if factor <= 0.0 || !factor.is_finite() {
            return None;
        }
        Some(current_volume / factor)
    }

    /// Placeholder rug probability: `min(100, |change| + 20)`.
    pub fn rug_probability(change_pct: f64) -> f64 {
        (change_pct.abs() + RUG_PROBABILITY_OFFSET).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(symbol: &str, volume: f64, change: f64) -> TokenRecord {
        TokenRecord {
            symbol: symbol.to_string(),
            name: format!("{} Token", symbol),
            price: 0.01,
            volume_24h: volume,
            volume_change_24h: change,
            market_cap: 1_000_000.0,
            price_change_24h: 0.0,
        }
    }

    #[test]
    fn test_severity_boundaries_are_exact() {
        assert_eq!(AnomalyDetector::severity_for(-80.1), Severity::Critical);
        assert_eq!(AnomalyDetector::severity_for(-80.0), Severity::High);
        assert_eq!(AnomalyDetector::severity_for(-70.1), Severity::High);
        assert_eq!(AnomalyDetector::severity_for(-70.0), Severity::Medium);
        assert_eq!(AnomalyDetector::severity_for(-60.1), Severity::Medium);
        assert_eq!(AnomalyDetector::severity_for(-60.0), Severity::Low);
        assert_eq!(AnomalyDetector::severity_for(-55.0), Severity::Low);
    }

    #[test]
    fn test_deep_drop_is_critical_not_low() {
        assert_eq!(AnomalyDetector::severity_for(-85.0), Severity::Critical);
        assert_eq!(AnomalyDetector::severity_for(-100.0), Severity::Critical);
    }

    #[test]
    fn test_normal_volume_back_solve() {
        // 75% drop: 250 now means 1000 before
        assert_eq!(AnomalyDetector::normal_volume(250.0, -75.0), Some(1000.0));
        assert_eq!(AnomalyDetector::normal_volume(500.0, -50.0), Some(1000.0));
    }

    #[test]
    fn test_normal_volume_total_drop_is_none() {
        assert_eq!(AnomalyDetector::normal_volume(0.0, -100.0), None);
        assert_eq!(AnomalyDetector::normal_volume(10.0, -120.0), None);
    }

    #[test]
    fn test_rug_probability_capped() {
        assert_eq!(AnomalyDetector::rug_probability(-55.0), 75.0);
        assert_eq!(AnomalyDetector::rug_probability(-80.0), 100.0);
        assert_eq!(AnomalyDetector::rug_probability(-95.0), 100.0);
        assert_eq!(AnomalyDetector::rug_probability(-250.0), 100.0);
        for change in [-50.5, -63.0, -79.9, -80.0, -99.0] {
            let p = AnomalyDetector::rug_probability(change);
            assert!((0.0..=100.0).contains(&p));
        }
    }

    #[test]
    fn test_scan_filters_strictly_below_threshold() {
        let tokens = vec![
            token("AAA", 100.0, -50.0),
            token("BBB", 100.0, -50.5),
            token("CCC", 100.0, 20.0),
            token("DDD", 100.0, -90.0),
        ];
        let anomalies = AnomalyDetector::scan(&tokens, DEFAULT_THRESHOLD, Utc::now());

        let symbols: Vec<&str> = anomalies.iter().map(|a| a.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BBB", "DDD"]);
        assert_eq!(anomalies[0].id, "anomaly-BBB");
        assert_eq!(anomalies[0].severity, Severity::Low);
        assert_eq!(anomalies[1].severity, Severity::Critical);
        assert_eq!(anomalies[1].percentage_change, 90.0);
        assert_eq!(anomalies[1].rug_probability, 100.0);
    }

    #[test]
    fn test_scan_output_is_subset_for_any_threshold() {
        let tokens: Vec<TokenRecord> = (0..40)
            .map(|i| token(&format!("T{}", i), 1000.0, -(i as f64) * 2.5))
            .collect();

        for threshold in [0.0, 10.0, 50.0, 62.5, 97.5, 100.0] {
            let anomalies = AnomalyDetector::scan(&tokens, threshold, Utc::now());
            for anomaly in &anomalies {
                let source = tokens
                    .iter()
                    .find(|t| t.symbol == anomaly.symbol)
                    .expect("anomaly must come from the input");
                assert!(source.volume_change_24h < -threshold);
            }
        }
    }

    #[test]
    fn test_validate_threshold() {
        assert!(AnomalyDetector::validate_threshold(50.0).is_ok());
        assert!(AnomalyDetector::validate_threshold(0.0).is_ok());
        assert_eq!(
            AnomalyDetector::validate_threshold(-1.0).unwrap_err().kind(),
            "invalid_input"
        );
        assert!(AnomalyDetector::validate_threshold(f64::NAN).is_err());
        assert!(AnomalyDetector::validate_threshold(f64::INFINITY).is_err());
    }
}
