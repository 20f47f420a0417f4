use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::{fs, path::Path};

use crate::domain::price::RuleConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorCfg {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_true")]
    pub daily_report: bool,
    #[serde(default = "default_report_hour")]
    pub report_hour: u32,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for MonitorCfg {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            data_dir: default_data_dir(),
            daily_report: true,
            report_hour: default_report_hour(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RulesCfg {
    pub threshold: Option<f64>,
    #[serde(default = "default_change_window_hours")]
    pub change_window_hours: i64,
    #[serde(default = "default_min_change_pct")]
    pub min_change_pct: f64,
    #[serde(default = "default_extrema_window_days")]
    pub extrema_window_days: i64,
}

impl Default for RulesCfg {
    fn default() -> Self {
        Self {
            threshold: None,
            change_window_hours: default_change_window_hours(),
            min_change_pct: default_min_change_pct(),
            extrema_window_days: default_extrema_window_days(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetentionCfg {
    #[serde(default = "default_history_days")]
    pub price_history_days: i64,
    #[serde(default = "default_alert_days")]
    pub alert_log_days: i64,
}

impl Default for RetentionCfg {
    fn default() -> Self {
        Self {
            price_history_days: default_history_days(),
            alert_log_days: default_alert_days(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CooldownCfg {
    #[serde(default = "default_alert_cooldown_minutes")]
    pub alert_cooldown_minutes: i64,
    #[serde(default = "default_report_cooldown_hours")]
    pub report_cooldown_hours: i64,
}

impl Default for CooldownCfg {
    fn default() -> Self {
        Self {
            alert_cooldown_minutes: default_alert_cooldown_minutes(),
            report_cooldown_hours: default_report_cooldown_hours(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifierCfg {
    #[serde(default = "default_notifier_kind")]
    pub kind: String,
    pub webhook_url: Option<String>,
}

impl Default for NotifierCfg {
    fn default() -> Self {
        Self {
            kind: default_notifier_kind(),
            webhook_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductCfg {
    pub key: String,
    pub name: Option<String>,
    pub url: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub monitor: MonitorCfg,
    #[serde(default)]
    pub rules: RulesCfg,
    #[serde(default)]
    pub retention: RetentionCfg,
    #[serde(default)]
    pub cooldown: CooldownCfg,
    #[serde(default)]
    pub notifier: NotifierCfg,
    #[serde(default)]
    pub products: Vec<ProductCfg>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path.as_ref())
            .with_context(|| format!("read config {}", path.as_ref().display()))?;
        let cfg: Self = toml::from_str(&s).context("parse config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(threshold) = self.rules.threshold {
            if !threshold.is_finite() || threshold <= 0.0 {
                bail!("rules.threshold must be positive, got {}", threshold);
            }
        }
        if self.rules.min_change_pct <= 0.0 {
            bail!("rules.min_change_pct must be positive");
        }
        if self.rules.change_window_hours <= 0 || self.rules.extrema_window_days <= 0 {
            bail!("rule windows must be positive");
        }
        if self.retention.price_history_days <= 0 || self.retention.alert_log_days <= 0 {
            bail!("retention horizons must be positive");
        }
        if self.monitor.report_hour > 23 {
            bail!("monitor.report_hour must be 0-23, got {}", self.monitor.report_hour);
        }
        if self.notifier.kind == "webhook" && self.notifier.webhook_url.is_none() {
            bail!("notifier.webhook_url is required when notifier.kind = \"webhook\"");
        }
        if !matches!(self.notifier.kind.as_str(), "log" | "webhook") {
            bail!("unknown notifier.kind: {}", self.notifier.kind);
        }

        let mut keys = HashSet::new();
        for product in &self.products {
            if product.key.trim().is_empty() {
                bail!("product key must not be empty");
            }
            if !keys.insert(product.key.as_str()) {
                bail!("duplicate product key: {}", product.key);
            }
        }
        Ok(())
    }

    pub fn rule_config(&self) -> RuleConfig {
        RuleConfig {
            threshold: self.rules.threshold,
            change_window_hours: self.rules.change_window_hours,
            min_change_pct: self.rules.min_change_pct,
            extrema_window_days: self.rules.extrema_window_days,
        }
    }

    pub fn price_retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.retention.price_history_days)
    }

    pub fn alert_retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.retention.alert_log_days)
    }

    pub fn alert_cooldown(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.cooldown.alert_cooldown_minutes)
    }

    pub fn report_cooldown(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cooldown.report_cooldown_hours)
    }
}

fn default_interval_secs() -> u64 {
    3600
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_true() -> bool {
    true
}

fn default_report_hour() -> u32 {
    12
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_change_window_hours() -> i64 {
    24
}

fn default_min_change_pct() -> f64 {
    5.0
}

fn default_extrema_window_days() -> i64 {
    7
}

fn default_history_days() -> i64 {
    30
}

fn default_alert_days() -> i64 {
    7
}

fn default_alert_cooldown_minutes() -> i64 {
    60
}

fn default_report_cooldown_hours() -> i64 {
    23
}

fn default_notifier_kind() -> String {
    "log".to_string()
}

fn default_currency() -> String {
    "SGD".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.monitor.interval_secs, 3600);
        assert_eq!(cfg.retention.price_history_days, 30);
        assert_eq!(cfg.retention.alert_log_days, 7);
        assert_eq!(cfg.cooldown.alert_cooldown_minutes, 60);
        assert_eq!(cfg.rules.min_change_pct, 5.0);
        assert_eq!(cfg.notifier.kind, "log");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let cfg: Config = toml::from_str(
            r#"
            [monitor]
            interval_secs = 600
            data_dir = "state"

            [rules]
            threshold = 3000.0
            min_change_pct = 3.0

            [notifier]
            kind = "webhook"
            webhook_url = "http://example.test/hook"

            [[products]]
            key = "gold-1oz"
            name = "1 oz Gold Bar"
            url = "http://example.test/gold"
            currency = "SGD"

            [[products]]
            key = "silver-1kg"
            url = "http://example.test/silver"
            "#,
        )
        .unwrap();
        cfg.validate().unwrap();

        assert_eq!(cfg.monitor.interval_secs, 600);
        assert_eq!(cfg.rules.threshold, Some(3000.0));
        assert_eq!(cfg.rules.change_window_hours, 24);
        assert_eq!(cfg.products.len(), 2);
        assert_eq!(cfg.products[1].currency, "SGD");
    }

    #[test]
    fn test_webhook_requires_url() {
        let cfg: Config = toml::from_str("[notifier]\nkind = \"webhook\"\n").unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_duplicate_product_keys_rejected() {
        let cfg: Config = toml::from_str(
            r#"
            [[products]]
            key = "gold-1oz"
            url = "http://example.test/a"

            [[products]]
            key = "gold-1oz"
            url = "http://example.test/b"
            "#,
        )
        .unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let cfg: Config = toml::from_str("[rules]\nthreshold = -1.0\n").unwrap();
        assert!(cfg.validate().is_err());
    }
}
