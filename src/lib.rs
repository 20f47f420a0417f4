//! Pricewatch - catalog price monitor
//! Sample history, movement rules, and alert dispatch with cooldowns

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod report;
pub mod shared;

// Re-export main types for convenience
pub use application::{IngestResult, IngestionCoordinator, PriceWatchService};
pub use domain::alert::{AlertEvent, AlertKind, AlertLedger};
pub use domain::price::{PriceSample, PriceStore, PriceSummary, RuleConfig, RuleEvaluator};
pub use report::DailyReport;
