//! Alert log and cooldown bookkeeping

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::domain::storage::{CooldownMap, StorageBackend};
use crate::shared::errors::StoreError;

use super::{AlertEvent, AlertKind};

/// Record of emitted alerts plus per-key dispatch cooldowns.
///
/// Cooldown keys are `kind:product_key` for rule alerts; ancillary dispatches
/// (the daily report) use plain string keys through the same mechanism.
/// Cooldown records are overwritten per key and never expire.
pub struct AlertLedger {
    alerts: Vec<AlertEvent>,
    cooldowns: CooldownMap,
    retention: Duration,
    storage: Arc<dyn StorageBackend>,
}

impl AlertLedger {
    /// Hydrate the ledger from the storage backend.
    pub fn load(storage: Arc<dyn StorageBackend>, retention: Duration) -> Result<Self, StoreError> {
        let alerts = storage.load_alerts()?;
        let cooldowns = storage.load_cooldowns()?;
        Ok(Self {
            alerts,
            cooldowns,
            retention,
            storage,
        })
    }

    /// Cooldown key for a rule alert.
    pub fn cooldown_key(kind: AlertKind, product_key: &str) -> String {
        format!("{}:{}", kind, product_key)
    }

    /// Whether a dispatch for this key is outside its cooldown window.
    pub fn should_dispatch(&self, key: &str, cooldown: Duration, now: DateTime<Utc>) -> bool {
        match self.cooldowns.get(key) {
            Some(last_sent) => now - *last_sent >= cooldown,
            None => true,
        }
    }

    /// Stamp a dispatch attempt for this key and persist.
    pub fn record_dispatch(&mut self, key: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        debug!("recording dispatch for {} at {}", key, at);
        self.cooldowns.insert(key.to_string(), at);
        self.storage.save_cooldowns(&self.cooldowns)
    }

    /// Append events to the alert log, prune expired ones, persist.
    pub fn persist(&mut self, events: &[AlertEvent], now: DateTime<Utc>) -> Result<(), StoreError> {
        self.alerts.extend_from_slice(events);
        self.prune(now);
        self.storage.save_alerts(&self.alerts)
    }

    /// Retained alerts triggered at or after the cutoff, oldest first.
    pub fn recent_alerts(&self, since: DateTime<Utc>) -> Vec<AlertEvent> {
        self.alerts
            .iter()
            .filter(|a| a.triggered_at >= since)
            .cloned()
            .collect()
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.len()
    }

    pub fn cooldown_entries(&self) -> usize {
        self.cooldowns.len()
    }

    /// Last recorded dispatch for a key, if any.
    pub fn last_dispatch(&self, key: &str) -> Option<DateTime<Utc>> {
        self.cooldowns.get(key).copied()
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.retention;
        self.alerts.retain(|a| a.triggered_at >= cutoff);
    }
}
