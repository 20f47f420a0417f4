//! Watch service - fetch-ingest cycles and the daily report

use std::sync::Arc;
use std::time::Instant;

use chrono::{Timelike, Utc};
use tokio::sync::RwLock;
use tokio::time::{interval, Duration as TokioDuration};
use tracing::{debug, error, info, warn};

use crate::config::ProductCfg;
use crate::domain::alert::AlertLedger;
use crate::domain::price::PriceStore;
use crate::infrastructure::fetcher::PriceFetcher;
use crate::infrastructure::notifier::Notifier;
use crate::report::DailyReport;
use crate::shared::utils::generate_id;

use super::IngestionCoordinator;

/// Cooldown key for the once-daily report dispatch.
const REPORT_COOLDOWN_KEY: &str = "daily_report";

const REPORT_WINDOW_HOURS: i64 = 24;

/// Watch loop configuration
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub interval_secs: u64,
    pub daily_report: bool,
    pub report_hour: u32,
    pub report_cooldown: chrono::Duration,
}

/// Run statistics for the watch loop
#[derive(Debug, Clone)]
pub struct MonitorStats {
    pub start_time: Instant,
    pub cycles_run: u64,
    pub samples_ingested: u64,
    pub alerts_dispatched: u64,
    pub fetch_failures: u64,
    pub last_update: Instant,
}

impl MonitorStats {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            cycles_run: 0,
            samples_ingested: 0,
            alerts_dispatched: 0,
            fetch_failures: 0,
            last_update: Instant::now(),
        }
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}

impl Default for MonitorStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one fetch-ingest cycle
#[derive(Debug, Clone, Default)]
pub struct CycleOutcome {
    pub fetched: usize,
    pub ingested: usize,
    pub alerts: usize,
    pub failures: usize,
}

/// Periodically fetches configured products and feeds them to the coordinator.
pub struct PriceWatchService {
    config: WatchConfig,
    products: Vec<ProductCfg>,
    fetcher: Arc<dyn PriceFetcher>,
    notifier: Arc<dyn Notifier>,
    coordinator: Arc<IngestionCoordinator>,
    store: Arc<RwLock<PriceStore>>,
    ledger: Arc<RwLock<AlertLedger>>,
    stats: Arc<RwLock<MonitorStats>>,
}

impl PriceWatchService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: WatchConfig,
        products: Vec<ProductCfg>,
        fetcher: Arc<dyn PriceFetcher>,
        notifier: Arc<dyn Notifier>,
        coordinator: Arc<IngestionCoordinator>,
        store: Arc<RwLock<PriceStore>>,
        ledger: Arc<RwLock<AlertLedger>>,
    ) -> Self {
        Self {
            config,
            products,
            fetcher,
            notifier,
            coordinator,
            store,
            ledger,
            stats: Arc::new(RwLock::new(MonitorStats::new())),
        }
    }

    /// One cycle: fetch and ingest every product, then maybe the daily report.
    ///
    /// Per-product failures are logged and counted; they never abort the cycle.
    pub async fn run_once(&self) -> CycleOutcome {
        let cycle_id = generate_id();
        info!(
            "starting price check cycle {} ({} products)",
            &cycle_id[..8],
            self.products.len()
        );

        let mut outcome = CycleOutcome::default();

        for product in &self.products {
            let fetched = match self.fetcher.fetch(product).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    warn!("fetch failed for {}: {}", product.key, e);
                    outcome.failures += 1;
                    continue;
                }
            };
            outcome.fetched += 1;

            let currency = fetched
                .currency
                .unwrap_or_else(|| product.currency.clone());

            match self
                .coordinator
                .ingest(&product.key, fetched.price, &currency, fetched.observed_at)
                .await
            {
                Ok(result) => {
                    outcome.ingested += 1;
                    outcome.alerts += result.alerts.len();
                    for alert in &result.alerts {
                        info!("🚨 {}", alert.message);
                    }
                }
                Err(e) => {
                    error!("ingest failed: {}", e);
                    outcome.failures += 1;
                }
            }
        }

        {
            let mut stats = self.stats.write().await;
            stats.cycles_run += 1;
            stats.samples_ingested += outcome.ingested as u64;
            stats.alerts_dispatched += outcome.alerts as u64;
            stats.fetch_failures += outcome.failures as u64;
            stats.last_update = Instant::now();
        }

        if self.config.daily_report {
            self.maybe_send_daily_report().await;
        }

        info!(
            "cycle {} done: {} ingested, {} alert(s), {} failure(s)",
            &cycle_id[..8],
            outcome.ingested,
            outcome.alerts,
            outcome.failures
        );
        outcome
    }

    /// The cycle on a fixed interval; runs until the task is aborted.
    pub async fn run_continuous(&self) {
        info!(
            "starting continuous monitoring (interval: {}s)",
            self.config.interval_secs
        );
        let mut ticker = interval(TokioDuration::from_secs(self.config.interval_secs.max(1)));
        loop {
            ticker.tick().await;
            self.run_once().await;
        }
    }

    pub async fn stats(&self) -> MonitorStats {
        self.stats.read().await.clone()
    }

    pub async fn build_report(&self) -> DailyReport {
        let store = self.store.read().await;
        DailyReport::from_store(&store, REPORT_WINDOW_HOURS)
    }

    async fn maybe_send_daily_report(&self) {
        let now = Utc::now();
        if now.hour() != self.config.report_hour {
            return;
        }

        let due = {
            let ledger = self.ledger.read().await;
            ledger.should_dispatch(REPORT_COOLDOWN_KEY, self.config.report_cooldown, now)
        };
        if !due {
            return;
        }

        let report = self.build_report().await;
        if report.is_empty() {
            debug!("daily report skipped: no data in window");
            return;
        }

        if let Err(e) = self.notifier.send_report(&report).await {
            error!("daily report delivery failed: {}", e);
        } else {
            info!("daily report sent ({} products)", report.entries.len());
        }

        let mut ledger = self.ledger.write().await;
        if let Err(e) = ledger.record_dispatch(REPORT_COOLDOWN_KEY, now) {
            error!("failed to record report dispatch: {}", e);
        }
    }
}
