//! Ingestion orchestration - the single entry point for new samples

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::domain::alert::{AlertEvent, AlertLedger};
use crate::domain::price::{PriceSample, PriceStore, RuleEvaluator};
use crate::infrastructure::notifier::Notifier;
use crate::shared::errors::IngestError;

/// Outcome of one ingestion call
#[derive(Debug, Clone)]
pub struct IngestResult {
    pub stored: bool,
    /// Alerts that passed the cooldown filter and were dispatched.
    pub alerts: Vec<AlertEvent>,
    /// Delivery failure, if the notifier rejected the dispatched alerts.
    /// The sample and alert records are kept either way.
    pub notify_error: Option<String>,
}

/// Runs the store-evaluate-filter-dispatch sequence for each new sample.
///
/// Ingestion for the same product key is serialized by a per-product lock;
/// different products may ingest in parallel.
pub struct IngestionCoordinator {
    store: Arc<RwLock<PriceStore>>,
    ledger: Arc<RwLock<AlertLedger>>,
    evaluator: RuleEvaluator,
    notifier: Arc<dyn Notifier>,
    alert_cooldown: Duration,
    product_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl IngestionCoordinator {
    pub fn new(
        store: Arc<RwLock<PriceStore>>,
        ledger: Arc<RwLock<AlertLedger>>,
        evaluator: RuleEvaluator,
        notifier: Arc<dyn Notifier>,
        alert_cooldown: Duration,
    ) -> Self {
        Self {
            store,
            ledger,
            evaluator,
            notifier,
            alert_cooldown,
            product_locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn ingest(
        &self,
        product_key: &str,
        price: f64,
        currency: &str,
        observed_at: DateTime<Utc>,
    ) -> Result<IngestResult, IngestError> {
        let lock = self.product_lock(product_key).await;
        let _guard = lock.lock().await;

        let now = Utc::now();
        let sample = PriceSample::new(product_key, price, currency, observed_at);

        let history = {
            let mut store = self.store.write().await;
            store
                .append(sample.clone())
                .map_err(|source| IngestError::store(product_key, source))?;
            store.query(product_key, DateTime::<Utc>::MIN_UTC)
        };
        debug!("stored sample for {}: {:.2} {}", product_key, price, currency);

        let candidates = self.evaluator.evaluate(&sample, &history, now);
        if candidates.is_empty() {
            return Ok(IngestResult {
                stored: true,
                alerts: Vec::new(),
                notify_error: None,
            });
        }
        info!("{} alert candidate(s) for {}", candidates.len(), product_key);

        let dispatchable: Vec<AlertEvent> = {
            let mut ledger = self.ledger.write().await;
            ledger
                .persist(&candidates, now)
                .map_err(|source| IngestError::store(product_key, source))?;
            candidates
                .iter()
                .filter(|alert| {
                    let key = AlertLedger::cooldown_key(alert.kind, &alert.product_key);
                    ledger.should_dispatch(&key, self.alert_cooldown, now)
                })
                .cloned()
                .collect()
        };

        if dispatchable.is_empty() {
            debug!("all alerts for {} suppressed by cooldown", product_key);
            return Ok(IngestResult {
                stored: true,
                alerts: Vec::new(),
                notify_error: None,
            });
        }

        // Cooldown is stamped for every attempted delivery, including failures.
        let notify_error = match self
            .notifier
            .notify_alerts(&dispatchable, std::slice::from_ref(&sample))
            .await
        {
            Ok(()) => None,
            Err(e) => {
                warn!("alert notification for {} failed: {}", product_key, e);
                Some(e.to_string())
            }
        };

        {
            let mut ledger = self.ledger.write().await;
            for alert in &dispatchable {
                let key = AlertLedger::cooldown_key(alert.kind, &alert.product_key);
                ledger
                    .record_dispatch(&key, now)
                    .map_err(|source| IngestError::store(product_key, source))?;
            }
        }

        Ok(IngestResult {
            stored: true,
            alerts: dispatchable,
            notify_error,
        })
    }

    async fn product_lock(&self, product_key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.product_locks.lock().await;
        locks
            .entry(product_key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
