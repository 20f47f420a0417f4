//! Application layer - use cases and services

pub mod commands;
pub mod coordinator;
pub mod monitor;

pub use commands::{Cli, CommandExecutor, Commands};
pub use coordinator::{IngestResult, IngestionCoordinator};
pub use monitor::{CycleOutcome, MonitorStats, PriceWatchService, WatchConfig};
