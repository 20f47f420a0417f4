//! Storage adapters for the persistence port

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::alert::AlertEvent;
use crate::domain::storage::{CooldownMap, PriceHistories, StorageBackend};
use crate::shared::errors::StoreError;

const HISTORY_FILE: &str = "price_history.json";
const ALERT_FILE: &str = "alert_log.json";
const COOLDOWN_FILE: &str = "last_alert.json";

/// JSON-file storage under a data directory.
///
/// Layout: `price_history.json`, `alert_log.json`, `last_alert.json`.
/// Missing files read as empty state.
pub struct JsonFileStorage {
    data_dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    fn read_json<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T, StoreError> {
        let path = self.data_dir.join(name);
        if !path.exists() {
            return Ok(T::default());
        }
        let raw = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(value)?;
        fs::write(self.data_dir.join(name), raw)?;
        Ok(())
    }
}

impl StorageBackend for JsonFileStorage {
    fn load_histories(&self) -> Result<PriceHistories, StoreError> {
        self.read_json(HISTORY_FILE)
    }

    fn save_histories(&self, histories: &PriceHistories) -> Result<(), StoreError> {
        self.write_json(HISTORY_FILE, histories)
    }

    fn load_alerts(&self) -> Result<Vec<AlertEvent>, StoreError> {
        self.read_json(ALERT_FILE)
    }

    fn save_alerts(&self, alerts: &[AlertEvent]) -> Result<(), StoreError> {
        self.write_json(ALERT_FILE, &alerts)
    }

    fn load_cooldowns(&self) -> Result<CooldownMap, StoreError> {
        self.read_json(COOLDOWN_FILE)
    }

    fn save_cooldowns(&self, cooldowns: &CooldownMap) -> Result<(), StoreError> {
        self.write_json(COOLDOWN_FILE, cooldowns)
    }
}

/// In-memory storage for tests and demos.
#[derive(Default)]
pub struct MemoryStorage {
    histories: Mutex<PriceHistories>,
    alerts: Mutex<Vec<AlertEvent>>,
    cooldowns: Mutex<CooldownMap>,
}

impl StorageBackend for MemoryStorage {
    fn load_histories(&self) -> Result<PriceHistories, StoreError> {
        Ok(self.histories.lock().expect("storage lock poisoned").clone())
    }

    fn save_histories(&self, histories: &PriceHistories) -> Result<(), StoreError> {
        *self.histories.lock().expect("storage lock poisoned") = histories.clone();
        Ok(())
    }

    fn load_alerts(&self) -> Result<Vec<AlertEvent>, StoreError> {
        Ok(self.alerts.lock().expect("storage lock poisoned").clone())
    }

    fn save_alerts(&self, alerts: &[AlertEvent]) -> Result<(), StoreError> {
        *self.alerts.lock().expect("storage lock poisoned") = alerts.to_vec();
        Ok(())
    }

    fn load_cooldowns(&self) -> Result<CooldownMap, StoreError> {
        Ok(self.cooldowns.lock().expect("storage lock poisoned").clone())
    }

    fn save_cooldowns(&self, cooldowns: &CooldownMap) -> Result<(), StoreError> {
        *self.cooldowns.lock().expect("storage lock poisoned") = cooldowns.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alert::AlertKind;
    use crate::domain::price::PriceSample;
    use chrono::Utc;

    fn temp_storage() -> (JsonFileStorage, PathBuf) {
        let dir = std::env::temp_dir().join(format!("pricewatch-test-{}", uuid::Uuid::new_v4()));
        (JsonFileStorage::new(&dir).unwrap(), dir)
    }

    #[test]
    fn test_missing_files_read_as_empty() {
        let (storage, dir) = temp_storage();
        assert!(storage.load_histories().unwrap().is_empty());
        assert!(storage.load_alerts().unwrap().is_empty());
        assert!(storage.load_cooldowns().unwrap().is_empty());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_round_trip() {
        let (storage, dir) = temp_storage();
        let now = Utc::now();

        let mut histories = PriceHistories::default();
        histories.insert(
            "gold-1oz".to_string(),
            vec![PriceSample::new("gold-1oz", 3000.0, "SGD", now)],
        );
        storage.save_histories(&histories).unwrap();

        let alerts = vec![AlertEvent {
            kind: AlertKind::NewLow,
            product_key: "gold-1oz".to_string(),
            value: 2900.0,
            message: "low".to_string(),
            triggered_at: now,
        }];
        storage.save_alerts(&alerts).unwrap();

        let mut cooldowns = CooldownMap::default();
        cooldowns.insert("new_low:gold-1oz".to_string(), now);
        storage.save_cooldowns(&cooldowns).unwrap();

        assert_eq!(storage.load_histories().unwrap(), histories);
        assert_eq!(storage.load_alerts().unwrap(), alerts);
        assert_eq!(storage.load_cooldowns().unwrap(), cooldowns);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_alert_kind_wire_names() {
        let json = serde_json::to_string(&AlertKind::PercentageChange).unwrap();
        assert_eq!(json, "\"percentage_change\"");
        let kind: AlertKind = serde_json::from_str("\"new_high\"").unwrap();
        assert_eq!(kind, AlertKind::NewHigh);
    }
}
