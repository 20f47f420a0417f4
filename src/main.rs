use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::warn;

use pricewatch::application::{Cli, CommandExecutor};
use pricewatch::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let cli = Cli::parse();

    let config = if Path::new(&cli.config).exists() {
        Config::from_file(&cli.config)?
    } else {
        warn!("config file {} not found, using defaults", cli.config);
        Config::default()
    };

    CommandExecutor::execute(cli.command, config).await?;
    Ok(())
}
