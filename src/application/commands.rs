//! CLI commands and handlers

use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use tokio::sync::RwLock;
use tracing::info;

use crate::config::Config;
use crate::domain::alert::AlertLedger;
use crate::domain::price::{PriceStore, RuleEvaluator};
use crate::domain::storage::StorageBackend;
use crate::infrastructure::fetcher::HttpPriceFetcher;
use crate::infrastructure::notifier::{LogNotifier, Notifier, WebhookNotifier};
use crate::infrastructure::storage::JsonFileStorage;
use crate::report::DailyReport;
use crate::shared::errors::AppError;
use crate::shared::utils::format_price;

use super::monitor::{PriceWatchService, WatchConfig};
use super::IngestionCoordinator;

#[derive(Parser)]
#[command(name = "pricewatch")]
#[command(version, about = "Catalog price monitor with movement alerts")]
pub struct Cli {
    /// Path to config file
    #[arg(long, default_value = "Config.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run fetch-ingest cycles for the configured products
    Watch {
        /// Override the cycle interval in seconds
        #[arg(short, long)]
        interval: Option<u64>,

        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },

    /// Ingest one sample directly
    Ingest {
        /// Product key
        #[arg(short, long)]
        product: String,

        /// Observed price
        #[arg(long)]
        price: f64,

        /// Currency code (defaults to the product's configured currency)
        #[arg(short, long)]
        currency: Option<String>,
    },

    /// Show a price summary for one product
    Summary {
        /// Product key
        #[arg(short, long)]
        product: String,

        /// Window in hours
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },

    /// List retained samples for one product
    History {
        /// Product key
        #[arg(short, long)]
        product: String,

        /// Window in hours
        #[arg(long, default_value_t = 24)]
        hours: i64,

        /// Maximum number of samples to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Render the daily report now
    Report {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show store and ledger statistics
    Status,
}

/// Wired-up engine components, shared by the commands
struct Engine {
    store: Arc<RwLock<PriceStore>>,
    ledger: Arc<RwLock<AlertLedger>>,
    notifier: Arc<dyn Notifier>,
    coordinator: Arc<IngestionCoordinator>,
}

fn build_engine(config: &Config) -> Result<Engine, AppError> {
    let storage: Arc<dyn StorageBackend> =
        Arc::new(JsonFileStorage::new(&config.monitor.data_dir)?);

    let store = Arc::new(RwLock::new(PriceStore::load(
        storage.clone(),
        config.price_retention(),
    )?));
    let ledger = Arc::new(RwLock::new(AlertLedger::load(
        storage,
        config.alert_retention(),
    )?));

    let notifier: Arc<dyn Notifier> = match config.notifier.kind.as_str() {
        "webhook" => {
            let url = config.notifier.webhook_url.clone().ok_or_else(|| {
                AppError::ConfigError("notifier.webhook_url is required".to_string())
            })?;
            Arc::new(WebhookNotifier::new(url))
        }
        _ => Arc::new(LogNotifier),
    };

    let coordinator = Arc::new(IngestionCoordinator::new(
        store.clone(),
        ledger.clone(),
        RuleEvaluator::new(config.rule_config()),
        notifier.clone(),
        config.alert_cooldown(),
    ));

    Ok(Engine {
        store,
        ledger,
        notifier,
        coordinator,
    })
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command
    pub async fn execute(command: Commands, config: Config) -> Result<(), AppError> {
        match command {
            Commands::Watch { interval, once } => {
                Self::execute_watch_command(interval, once, config).await
            }
            Commands::Ingest {
                product,
                price,
                currency,
            } => Self::execute_ingest_command(product, price, currency, config).await,
            Commands::Summary { product, hours } => {
                Self::execute_summary_command(product, hours, config).await
            }
            Commands::History {
                product,
                hours,
                limit,
            } => Self::execute_history_command(product, hours, limit, config).await,
            Commands::Report { json } => Self::execute_report_command(json, config).await,
            Commands::Status => Self::execute_status_command(config).await,
        }
    }

    async fn execute_watch_command(
        interval: Option<u64>,
        once: bool,
        config: Config,
    ) -> Result<(), AppError> {
        if config.products.is_empty() {
            return Err(AppError::ConfigError(
                "no products configured; add [[products]] entries".to_string(),
            ));
        }

        let engine = build_engine(&config)?;
        let fetcher = Arc::new(HttpPriceFetcher::new(std::time::Duration::from_secs(
            config.monitor.fetch_timeout_secs,
        ))?);

        let watch_config = WatchConfig {
            interval_secs: interval.unwrap_or(config.monitor.interval_secs),
            daily_report: config.monitor.daily_report,
            report_hour: config.monitor.report_hour,
            report_cooldown: config.report_cooldown(),
        };

        info!("📈 watching {} product(s)", config.products.len());
        let service = PriceWatchService::new(
            watch_config,
            config.products.clone(),
            fetcher,
            engine.notifier.clone(),
            engine.coordinator.clone(),
            engine.store.clone(),
            engine.ledger.clone(),
        );

        if once {
            let outcome = service.run_once().await;
            println!(
                "cycle complete: {} ingested, {} alert(s), {} failure(s)",
                outcome.ingested, outcome.alerts, outcome.failures
            );
        } else {
            service.run_continuous().await;
        }
        Ok(())
    }

    async fn execute_ingest_command(
        product: String,
        price: f64,
        currency: Option<String>,
        config: Config,
    ) -> Result<(), AppError> {
        let currency = currency.unwrap_or_else(|| {
            config
                .products
                .iter()
                .find(|p| p.key == product)
                .map(|p| p.currency.clone())
                .unwrap_or_else(|| "SGD".to_string())
        });

        let engine = build_engine(&config)?;
        let result = engine
            .coordinator
            .ingest(&product, price, &currency, Utc::now())
            .await?;

        println!(
            "stored {} = {}",
            product,
            format_price(price, &currency)
        );
        if result.alerts.is_empty() {
            println!("no alerts triggered");
        } else {
            for alert in &result.alerts {
                println!("🚨 [{}] {}", alert.kind, alert.message);
            }
        }
        Ok(())
    }

    async fn execute_summary_command(
        product: String,
        hours: i64,
        config: Config,
    ) -> Result<(), AppError> {
        let engine = build_engine(&config)?;
        let store = engine.store.read().await;

        match store.summary(&product, Duration::hours(hours)) {
            Some(summary) => {
                println!("{} over the last {}h:", product, hours);
                println!("  latest: {:.2}", summary.latest);
                println!("  min:    {:.2}", summary.min);
                println!("  max:    {:.2}", summary.max);
                println!("  avg:    {:.2}", summary.avg);
                println!("  count:  {}", summary.count);
            }
            None => println!("no data for {} in the last {}h", product, hours),
        }
        Ok(())
    }

    async fn execute_history_command(
        product: String,
        hours: i64,
        limit: usize,
        config: Config,
    ) -> Result<(), AppError> {
        let engine = build_engine(&config)?;
        let store = engine.store.read().await;

        let since = Utc::now() - Duration::hours(hours);
        let samples = store.query(&product, since);
        if samples.is_empty() {
            println!("no samples for {} in the last {}h", product, hours);
            return Ok(());
        }

        let shown = samples.len().min(limit);
        println!(
            "{} samples for {} (showing newest {})",
            samples.len(),
            product,
            shown
        );
        for sample in samples.iter().rev().take(limit) {
            println!(
                "  {}  {}",
                sample.observed_at.format("%Y-%m-%d %H:%M:%S"),
                format_price(sample.price, &sample.currency)
            );
        }
        Ok(())
    }

    async fn execute_report_command(json: bool, config: Config) -> Result<(), AppError> {
        let engine = build_engine(&config)?;
        let store = engine.store.read().await;

        let report = DailyReport::from_store(&store, 24);
        if json {
            println!(
                "{}",
                report
                    .to_json()
                    .map_err(crate::shared::errors::StoreError::from)?
            );
        } else {
            print!("{}", report.render_text());
        }
        Ok(())
    }

    async fn execute_status_command(config: Config) -> Result<(), AppError> {
        let engine = build_engine(&config)?;
        let store = engine.store.read().await;
        let ledger = engine.ledger.read().await;

        println!("pricewatch {} status:", env!("CARGO_PKG_VERSION"));
        println!("  data dir:          {}", config.monitor.data_dir);
        println!("  products tracked:  {}", store.product_keys().len());
        println!("  retained samples:  {}", store.sample_count());
        println!("  retained alerts:   {}", ledger.alert_count());
        println!("  cooldown entries:  {}", ledger.cooldown_entries());
        match ledger.last_dispatch("daily_report") {
            Some(at) => println!("  last daily report: {}", at.format("%Y-%m-%d %H:%M")),
            None => println!("  last daily report: never"),
        }

        let since = Utc::now() - Duration::hours(24);
        for alert in ledger.recent_alerts(since) {
            println!("  recent: [{}] {}", alert.kind, alert.message);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
