//! Alert Feed CLI
//!
//! Command-line interface for the incremental alert feed service.

use std::path::PathBuf;

use alert_feed::{load_config, AlertFeedBuilder, Config};
use clap::Parser;
use tracing::Level;

#[derive(Parser)]
#[command(name = "alert-feed")]
#[command(about = "Incremental alert feed with item authorization")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Alerts server base URL (overrides config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Dashboard port (overrides config file)
    #[arg(long)]
    dashboard_port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, base_url={:?}, dashboard_port={:?}, log_level={:?}",
        args.config,
        args.base_url,
        args.dashboard_port,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(base_url) = args.base_url {
        config.feed.base_url = base_url;
    }
    if let Some(dashboard_port) = args.dashboard_port {
        config.dashboard.port = dashboard_port;
    }

    tracing::info!("Starting alert feed service");
    tracing::debug!(
        "Polling interval: {:?}, dedupe: {}, dashboard: {}",
        config.feed.polling_interval,
        config.feed.dedupe_by_identity,
        config.dashboard.enabled
    );

    AlertFeedBuilder::new(config).build()?.start().await?;

    Ok(())
}
