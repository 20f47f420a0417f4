//! Price domain - sample history and movement rules

mod rules;
mod store;

pub use rules::{RuleConfig, RuleEvaluator};
pub use store::PriceStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observed price at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub product_key: String,
    pub price: f64,
    pub currency: String,
    pub observed_at: DateTime<Utc>,
}

impl PriceSample {
    pub fn new(
        product_key: impl Into<String>,
        price: f64,
        currency: impl Into<String>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            product_key: product_key.into(),
            price,
            currency: currency.into(),
            observed_at,
        }
    }
}

/// Aggregated view of one product's history over a query window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub product_key: String,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub count: usize,
    pub latest: f64,
    pub window_hours: i64,
}
