//! Alert domain - alert events and the dispatch ledger

mod ledger;

pub use ledger::AlertLedger;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classes of price alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Threshold,
    PercentageChange,
    NewLow,
    NewHigh,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Threshold => "threshold",
            AlertKind::PercentageChange => "percentage_change",
            AlertKind::NewLow => "new_low",
            AlertKind::NewHigh => "new_high",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One triggered alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub product_key: String,
    pub value: f64,
    pub message: String,
    pub triggered_at: DateTime<Utc>,
}
