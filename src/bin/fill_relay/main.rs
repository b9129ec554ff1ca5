//! Hyperliquid wallet fill relay.
//!
//! This binary subscribes to the `userFills` feed for a set of wallets and
//! forwards every new fill to Telegram, or to the log when no bot is
//! configured.

mod config;
mod error;

use clap::Parser;
use fill_relay::{
    RelayConfig,
    connection::{ConnectionManager, WsConnector},
    notify::{self, Destination},
};
use std::{process::exit, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use config::{CliConfig, EnvConfig};

/// How long queued notifications may take to flush on shutdown.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

fn load_config(cli: &CliConfig) -> error::Result<(RelayConfig, Destination)> {
    let env = EnvConfig::from_env()?;
    let relay = config::to_relay_config(&env, cli)?;
    Ok((relay, env.destination()))
}

#[tokio::main]
async fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    // Parse CLI arguments
    let cli_config = CliConfig::parse();

    // Set up logging
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let (relay_config, destination) = match load_config(&cli_config) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{}", e);
            exit(1);
        }
    };

    info!(
        endpoint = %relay_config.endpoint(),
        wallets = relay_config.wallets().len(),
        ?destination,
        "Starting fill relay"
    );

    let (notifications, queue) = notify::channel(relay_config.queue_capacity());
    let delivery = tokio::spawn(notify::run_delivery(queue, destination));

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Shutdown requested");
                    shutdown.cancel();
                }
                Err(e) => error!(%e, "Failed to listen for shutdown signal"),
            }
        }
    });

    let connector = WsConnector::new(
        relay_config.endpoint().clone(),
        relay_config.ping_interval(),
        relay_config.ping_timeout(),
    );
    let mut manager =
        ConnectionManager::new(&relay_config, connector, notifications, tokio::time::sleep);
    manager.run(shutdown).await;

    // Dropping the manager closes the queue so the delivery worker can finish.
    drop(manager);
    match tokio::time::timeout(FLUSH_TIMEOUT, delivery).await {
        Ok(Ok(())) => info!("Notifications flushed"),
        Ok(Err(e)) => error!(%e, "Delivery worker failed"),
        Err(_) => warn!(timeout = ?FLUSH_TIMEOUT, "Pending notifications dropped on exit"),
    }
}
