//! Storage port - durable state behind a narrow interface

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::alert::AlertEvent;
use crate::domain::price::PriceSample;
use crate::shared::errors::StoreError;

/// Retained samples per product key, each ascending by `observed_at`.
pub type PriceHistories = HashMap<String, Vec<PriceSample>>;

/// Last dispatch timestamp per cooldown key.
pub type CooldownMap = HashMap<String, DateTime<Utc>>;

/// Durable storage for price histories, the alert log, and cooldown records.
///
/// Implementations only provide whole-state load and save; ordering and
/// retention pruning are enforced by the owning components before save.
pub trait StorageBackend: Send + Sync {
    fn load_histories(&self) -> Result<PriceHistories, StoreError>;

    fn save_histories(&self, histories: &PriceHistories) -> Result<(), StoreError>;

    fn load_alerts(&self) -> Result<Vec<AlertEvent>, StoreError>;

    fn save_alerts(&self, alerts: &[AlertEvent]) -> Result<(), StoreError>;

    fn load_cooldowns(&self) -> Result<CooldownMap, StoreError>;

    fn save_cooldowns(&self, cooldowns: &CooldownMap) -> Result<(), StoreError>;
}
