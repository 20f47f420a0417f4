//! Notification adapters

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::alert::AlertEvent;
use crate::domain::price::PriceSample;
use crate::report::DailyReport;
use crate::shared::errors::NotifyError;

/// Delivers alerts and reports to subscribers.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver triggered alerts along with the samples behind them.
    async fn notify_alerts(
        &self,
        alerts: &[AlertEvent],
        snapshot: &[PriceSample],
    ) -> Result<(), NotifyError>;

    /// Deliver a daily summary report.
    async fn send_report(&self, report: &DailyReport) -> Result<(), NotifyError>;
}

/// Writes notifications to the application log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_alerts(
        &self,
        alerts: &[AlertEvent],
        _snapshot: &[PriceSample],
    ) -> Result<(), NotifyError> {
        for alert in alerts {
            info!("🚨 [{}] {}", alert.kind, alert.message);
        }
        Ok(())
    }

    async fn send_report(&self, report: &DailyReport) -> Result<(), NotifyError> {
        for line in report.render_text().lines() {
            info!("{}", line);
        }
        Ok(())
    }
}

/// Posts notifications as JSON to a webhook URL.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    async fn post(&self, payload: serde_json::Value) -> Result<(), NotifyError> {
        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify_alerts(
        &self,
        alerts: &[AlertEvent],
        snapshot: &[PriceSample],
    ) -> Result<(), NotifyError> {
        self.post(json!({
            "kind": "price_alerts",
            "alerts": alerts,
            "snapshot": snapshot,
        }))
        .await
    }

    async fn send_report(&self, report: &DailyReport) -> Result<(), NotifyError> {
        self.post(json!({
            "kind": "daily_report",
            "report": report,
        }))
        .await
    }
}
