// src/report.rs
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::price::{PriceStore, PriceSummary};

/// Daily price summary report
#[derive(Debug, Serialize, Deserialize)]
pub struct DailyReport {
    pub generated_at: DateTime<Utc>,
    pub window_hours: i64,
    pub entries: Vec<PriceSummary>,
}

impl DailyReport {
    pub fn new(window_hours: i64, entries: Vec<PriceSummary>) -> Self {
        Self {
            generated_at: Utc::now(),
            window_hours,
            entries,
        }
    }

    /// Summaries over the window for every product with data, sorted by key.
    pub fn from_store(store: &PriceStore, window_hours: i64) -> Self {
        let window = Duration::hours(window_hours);
        let mut keys = store.product_keys();
        keys.sort();

        let entries = keys
            .iter()
            .filter_map(|key| store.summary(key, window))
            .collect();

        Self::new(window_hours, entries)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_text(&self) -> String {
        let mut out = format!(
            "Price report {} (last {}h)\n",
            self.generated_at.format("%Y-%m-%d %H:%M"),
            self.window_hours
        );
        if self.entries.is_empty() {
            out.push_str("  no data in window\n");
            return out;
        }
        for entry in &self.entries {
            out.push_str(&format!(
                "  {:<20} latest {:>10.2}  min {:>10.2}  max {:>10.2}  avg {:>10.2}  ({} samples)\n",
                entry.product_key, entry.latest, entry.min, entry.max, entry.avg, entry.count
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(key: &str) -> PriceSummary {
        PriceSummary {
            product_key: key.to_string(),
            min: 2950.0,
            max: 3100.0,
            avg: 3025.0,
            count: 4,
            latest: 3050.0,
            window_hours: 24,
        }
    }

    #[test]
    fn test_report_creation() {
        let report = DailyReport::new(24, vec![summary("gold-1oz")]);
        assert_eq!(report.window_hours, 24);
        assert_eq!(report.entries.len(), 1);
        assert!(report.generated_at > Utc::now() - Duration::seconds(1));
    }

    #[test]
    fn test_report_serialization() {
        let report = DailyReport::new(24, vec![summary("gold-1oz")]);
        let json = report.to_json().unwrap();
        let deserialized: DailyReport = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.entries, report.entries);
        assert_eq!(deserialized.window_hours, 24);
    }

    #[test]
    fn test_render_text() {
        let report = DailyReport::new(24, vec![summary("gold-1oz")]);
        let text = report.render_text();
        assert!(text.contains("gold-1oz"));
        assert!(text.contains("3050.00"));

        let empty = DailyReport::new(24, Vec::new());
        assert!(empty.render_text().contains("no data in window"));
    }
}
