//! Movement rules - pure decisions over a history snapshot

use chrono::{DateTime, Duration, Utc};

use crate::domain::alert::{AlertEvent, AlertKind};
use crate::shared::utils::{calculate_percentage_change, format_price};

use super::PriceSample;

/// Per-rule parameters
#[derive(Debug, Clone)]
pub struct RuleConfig {
    /// Absolute price floor; the threshold rule is disabled when unset.
    pub threshold: Option<f64>,
    pub change_window_hours: i64,
    pub min_change_pct: f64,
    pub extrema_window_days: i64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            threshold: None,
            change_window_hours: 24,
            min_change_pct: 5.0,
            extrema_window_days: 7,
        }
    }
}

/// Evaluates movement rules against a just-appended sample.
///
/// Stateless; the caller passes the product's history, which already includes
/// the sample as its newest entry. Rules abstain rather than fail when history
/// is insufficient.
pub struct RuleEvaluator {
    config: RuleConfig,
}

impl RuleEvaluator {
    pub fn new(config: RuleConfig) -> Self {
        Self { config }
    }

    /// All rules in fixed order: threshold, percentage change, extrema.
    pub fn evaluate(
        &self,
        sample: &PriceSample,
        history: &[PriceSample],
        now: DateTime<Utc>,
    ) -> Vec<AlertEvent> {
        let mut alerts = Vec::new();
        if let Some(alert) = self.check_threshold(sample, now) {
            alerts.push(alert);
        }
        if let Some(alert) = self.check_percentage_change(sample, history, now) {
            alerts.push(alert);
        }
        if let Some(alert) = self.check_extrema(sample, history, now) {
            alerts.push(alert);
        }
        alerts
    }

    fn check_threshold(&self, sample: &PriceSample, now: DateTime<Utc>) -> Option<AlertEvent> {
        let threshold = self.config.threshold?;
        if sample.price > threshold {
            return None;
        }
        Some(AlertEvent {
            kind: AlertKind::Threshold,
            product_key: sample.product_key.clone(),
            value: threshold,
            message: format!(
                "{} dropped to {}, at or below the {:.2} threshold",
                sample.product_key,
                format_price(sample.price, &sample.currency),
                threshold
            ),
            triggered_at: now,
        })
    }

    fn check_percentage_change(
        &self,
        sample: &PriceSample,
        history: &[PriceSample],
        now: DateTime<Utc>,
    ) -> Option<AlertEvent> {
        let cutoff = now - Duration::hours(self.config.change_window_hours);
        // Earliest sample still older than the window; history is ascending.
        let baseline = history.iter().find(|s| s.observed_at < cutoff)?;

        let change_pct = calculate_percentage_change(baseline.price, sample.price);
        if change_pct.abs() < self.config.min_change_pct {
            return None;
        }

        let direction = if change_pct > 0.0 { "up" } else { "down" };
        Some(AlertEvent {
            kind: AlertKind::PercentageChange,
            product_key: sample.product_key.clone(),
            value: change_pct,
            message: format!(
                "{} moved {} {:.1}% over {}h: {:.2} -> {:.2}",
                sample.product_key,
                direction,
                change_pct.abs(),
                self.config.change_window_hours,
                baseline.price,
                sample.price
            ),
            triggered_at: now,
        })
    }

    fn check_extrema(
        &self,
        sample: &PriceSample,
        history: &[PriceSample],
        now: DateTime<Utc>,
    ) -> Option<AlertEvent> {
        let cutoff = now - Duration::days(self.config.extrema_window_days);

        // The just-appended sample sits at the end of the history; extrema are
        // computed over the samples before it.
        let prior = match history.last() {
            Some(last) if last.observed_at == sample.observed_at && last.price == sample.price => {
                &history[..history.len() - 1]
            }
            _ => history,
        };

        let window: Vec<f64> = prior
            .iter()
            .filter(|s| s.observed_at >= cutoff)
            .map(|s| s.price)
            .collect();
        if window.is_empty() {
            return None;
        }

        let min = window.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = window.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        if sample.price < min {
            Some(AlertEvent {
                kind: AlertKind::NewLow,
                product_key: sample.product_key.clone(),
                value: sample.price,
                message: format!(
                    "{} hit a {}-day low: {} (previous low {:.2})",
                    sample.product_key,
                    self.config.extrema_window_days,
                    format_price(sample.price, &sample.currency),
                    min
                ),
                triggered_at: now,
            })
        } else if sample.price > max {
            Some(AlertEvent {
                kind: AlertKind::NewHigh,
                product_key: sample.product_key.clone(),
                value: sample.price,
                message: format!(
                    "{} hit a {}-day high: {} (previous high {:.2})",
                    sample.product_key,
                    self.config.extrema_window_days,
                    format_price(sample.price, &sample.currency),
                    max
                ),
                triggered_at: now,
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(price: f64, observed_at: DateTime<Utc>) -> PriceSample {
        PriceSample::new("gold-1oz", price, "SGD", observed_at)
    }

    fn evaluator(threshold: Option<f64>) -> RuleEvaluator {
        RuleEvaluator::new(RuleConfig {
            threshold,
            ..RuleConfig::default()
        })
    }

    #[test]
    fn test_threshold_fires_at_or_below() {
        let now = Utc::now();
        let evaluator = evaluator(Some(3000.0));
        let current = sample(2900.0, now);
        let history = vec![current.clone()];

        let alerts = evaluator.evaluate(&current, &history, now);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Threshold);
        assert_eq!(alerts[0].value, 3000.0);
        assert!(alerts[0].message.contains("2900.00"));
        assert!(alerts[0].message.contains("3000.00"));
    }

    #[test]
    fn test_threshold_silent_above() {
        let now = Utc::now();
        let evaluator = evaluator(Some(3000.0));
        let current = sample(3100.0, now);
        let history = vec![current.clone()];

        assert!(evaluator.evaluate(&current, &history, now).is_empty());
    }

    #[test]
    fn test_threshold_disabled_when_unset() {
        let now = Utc::now();
        let evaluator = evaluator(None);
        let current = sample(1.0, now);
        let history = vec![current.clone()];

        assert!(evaluator.evaluate(&current, &history, now).is_empty());
    }

    #[test]
    fn test_percentage_change_fires_up() {
        let now = Utc::now();
        let evaluator = evaluator(None);
        let current = sample(3200.0, now);
        let history = vec![sample(3000.0, now - Duration::hours(25)), current.clone()];

        let alerts = evaluator.evaluate(&current, &history, now);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::PercentageChange);
        assert!((alerts[0].value - 6.6666).abs() < 0.01);
        assert!(alerts[0].message.contains("up"));
    }

    #[test]
    fn test_percentage_change_below_minimum_abstains() {
        let now = Utc::now();
        let evaluator = evaluator(None);
        let current = sample(3100.0, now);
        let history = vec![sample(3000.0, now - Duration::hours(25)), current.clone()];

        assert!(evaluator.evaluate(&current, &history, now).is_empty());
    }

    #[test]
    fn test_percentage_change_direction_down() {
        let now = Utc::now();
        let evaluator = evaluator(None);
        let current = sample(2800.0, now);
        let history = vec![sample(3000.0, now - Duration::hours(25)), current.clone()];

        let alerts = evaluator.evaluate(&current, &history, now);
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].value < 0.0);
        assert!(alerts[0].message.contains("down"));
    }

    #[test]
    fn test_percentage_change_needs_sample_older_than_window() {
        let now = Utc::now();
        let evaluator = evaluator(None);
        let current = sample(3200.0, now);
        // Only recent history: nothing predates the 24h window.
        let history = vec![sample(3000.0, now - Duration::hours(2)), current.clone()];

        assert!(evaluator.evaluate(&current, &history, now).is_empty());
    }

    #[test]
    fn test_percentage_change_uses_earliest_baseline() {
        let now = Utc::now();
        let evaluator = evaluator(None);
        let current = sample(3200.0, now);
        // Both predate the window; the older one is the baseline, so the
        // change stays below 5% against 3100 but reaches 6.7% against 3000.
        let history = vec![
            sample(3000.0, now - Duration::hours(48)),
            sample(3100.0, now - Duration::hours(25)),
            current.clone(),
        ];

        let alerts = evaluator.evaluate(&current, &history, now);
        assert_eq!(alerts.len(), 1);
        assert!((alerts[0].value - 6.6666).abs() < 0.01);
    }

    fn extrema_history(current: &PriceSample, now: DateTime<Utc>) -> Vec<PriceSample> {
        let mut history = vec![
            sample(3000.0, now - Duration::hours(20)),
            sample(3100.0, now - Duration::hours(15)),
            sample(2950.0, now - Duration::hours(10)),
            sample(3050.0, now - Duration::hours(5)),
        ];
        history.push(current.clone());
        history
    }

    #[test]
    fn test_extrema_new_low() {
        let now = Utc::now();
        let evaluator = evaluator(None);
        let current = sample(2900.0, now);
        let history = extrema_history(&current, now);

        let alerts = evaluator.evaluate(&current, &history, now);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::NewLow);
        assert_eq!(alerts[0].value, 2900.0);
    }

    #[test]
    fn test_extrema_new_high() {
        let now = Utc::now();
        let evaluator = evaluator(None);
        let current = sample(3150.0, now);
        let history = extrema_history(&current, now);

        let alerts = evaluator.evaluate(&current, &history, now);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::NewHigh);
        assert_eq!(alerts[0].value, 3150.0);
    }

    #[test]
    fn test_extrema_inside_range_abstains() {
        let now = Utc::now();
        let evaluator = evaluator(None);
        let current = sample(3020.0, now);
        let history = extrema_history(&current, now);

        assert!(evaluator.evaluate(&current, &history, now).is_empty());
    }

    #[test]
    fn test_extrema_abstains_without_prior_samples() {
        let now = Utc::now();
        let evaluator = evaluator(None);
        let current = sample(3000.0, now);
        let history = vec![current.clone()];

        assert!(evaluator.evaluate(&current, &history, now).is_empty());
    }

    #[test]
    fn test_equal_extreme_does_not_fire() {
        let now = Utc::now();
        let evaluator = evaluator(None);
        let current = sample(2950.0, now);
        let history = extrema_history(&current, now);

        assert!(evaluator.evaluate(&current, &history, now).is_empty());
    }

    #[test]
    fn test_rules_evaluate_in_fixed_order() {
        let now = Utc::now();
        let evaluator = evaluator(Some(3000.0));
        // Below threshold, down more than 5% from the day-old baseline, and
        // below every prior window sample: all three rules fire.
        let current = sample(2700.0, now);
        let mut history = vec![sample(3000.0, now - Duration::hours(25))];
        history.extend(extrema_history(&current, now));

        let alerts = evaluator.evaluate(&current, &history, now);
        let kinds: Vec<AlertKind> = alerts.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                AlertKind::Threshold,
                AlertKind::PercentageChange,
                AlertKind::NewLow
            ]
        );
    }
}
