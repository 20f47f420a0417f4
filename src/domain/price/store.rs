//! Append-only price history store with retention pruning

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::domain::storage::{PriceHistories, StorageBackend};
use crate::shared::errors::StoreError;

use super::{PriceSample, PriceSummary};

/// Per-product price histories, bounded by a retention horizon.
///
/// Histories stay ascending by `observed_at`; samples older than the latest
/// stored one for their product are rejected rather than inserted.
pub struct PriceStore {
    histories: PriceHistories,
    retention: Duration,
    storage: Arc<dyn StorageBackend>,
}

impl PriceStore {
    /// Hydrate the store from the storage backend.
    pub fn load(storage: Arc<dyn StorageBackend>, retention: Duration) -> Result<Self, StoreError> {
        let histories = storage.load_histories()?;
        Ok(Self {
            histories,
            retention,
            storage,
        })
    }

    /// Append a sample, prune expired entries for all products, persist.
    pub fn append(&mut self, sample: PriceSample) -> Result<(), StoreError> {
        self.validate(&sample)?;

        if let Some(latest) = self.histories.get(&sample.product_key).and_then(|h| h.last()) {
            if sample.observed_at < latest.observed_at {
                return Err(StoreError::StaleSample {
                    product_key: sample.product_key.clone(),
                    observed_at: sample.observed_at,
                    latest: latest.observed_at,
                });
            }
        }

        debug!(
            "appending sample: {} = {:.2} {} at {}",
            sample.product_key, sample.price, sample.currency, sample.observed_at
        );

        self.histories
            .entry(sample.product_key.clone())
            .or_default()
            .push(sample);

        self.prune(Utc::now());
        self.storage.save_histories(&self.histories)
    }

    /// Retained samples for one product at or after the cutoff, ascending by time.
    pub fn query(&self, product_key: &str, since: DateTime<Utc>) -> Vec<PriceSample> {
        self.histories
            .get(product_key)
            .map(|history| {
                history
                    .iter()
                    .filter(|s| s.observed_at >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Aggregate stats over the given window, or `None` when it holds no samples.
    pub fn summary(&self, product_key: &str, window: Duration) -> Option<PriceSummary> {
        let since = Utc::now() - window;
        let samples = self.query(product_key, since);
        if samples.is_empty() {
            return None;
        }

        let prices: Vec<f64> = samples.iter().map(|s| s.price).collect();
        let min = prices.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = prices.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let avg = prices.iter().sum::<f64>() / prices.len() as f64;
        let latest = *prices.last()?;

        Some(PriceSummary {
            product_key: product_key.to_string(),
            min,
            max,
            avg,
            count: prices.len(),
            latest,
            window_hours: window.num_hours(),
        })
    }

    /// Newest retained sample for one product.
    pub fn latest(&self, product_key: &str) -> Option<&PriceSample> {
        self.histories.get(product_key).and_then(|h| h.last())
    }

    /// Product keys with at least one retained sample.
    pub fn product_keys(&self) -> Vec<String> {
        self.histories
            .iter()
            .filter(|(_, h)| !h.is_empty())
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Total retained samples across all products.
    pub fn sample_count(&self) -> usize {
        self.histories.values().map(Vec::len).sum()
    }

    /// Drop expired samples and persist; returns the number removed.
    pub fn prune_expired(&mut self) -> Result<usize, StoreError> {
        let removed = self.prune(Utc::now());
        self.storage.save_histories(&self.histories)?;
        Ok(removed)
    }

    fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.retention;
        let mut removed = 0;
        for history in self.histories.values_mut() {
            let before = history.len();
            history.retain(|s| s.observed_at >= cutoff);
            removed += before - history.len();
        }
        removed
    }

    fn validate(&self, sample: &PriceSample) -> Result<(), StoreError> {
        if !sample.price.is_finite() || sample.price <= 0.0 {
            return Err(StoreError::InvalidSample {
                product_key: sample.product_key.clone(),
                reason: format!("price must be positive, got {}", sample.price),
            });
        }
        if sample.currency.trim().is_empty() {
            return Err(StoreError::InvalidSample {
                product_key: sample.product_key.clone(),
                reason: "currency must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
