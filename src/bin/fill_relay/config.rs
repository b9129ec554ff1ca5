//! Configuration for the fill relay.
//!
//! Configuration comes from two sources:
//! - Environment variables (via .env file or shell): feed endpoint, wallets,
//!   Telegram credentials
//! - CLI arguments (each also readable from an env var): timing and cache
//!   tuning

use std::{num::NonZeroUsize, time::Duration};

use clap::Parser;
use fill_relay::{
    DEFAULT_DEDUP_CAPACITY, DEFAULT_QUEUE_CAPACITY, RelayConfig,
    notify::{Destination, LogNotifier, TelegramNotifier},
    types::WatchList,
};
use tracing::warn;
use url::Url;

/// Environment configuration (connection details, credentials).
#[derive(derive_more::Debug, Default, serde::Deserialize)]
pub struct EnvConfig {
    /// Feed websocket URL, e.g. wss://api.hyperliquid.xyz/ws
    pub hl_ws_url: Option<String>,

    /// Comma-separated wallet addresses
    pub wallet_addresses: Option<String>,

    /// Telegram bot token
    #[debug(skip)]
    pub telegram_bot_token: Option<String>,

    /// Telegram chat ID to post to
    pub telegram_chat_id: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Telegram when both credentials are set, the log otherwise.
    pub fn destination(&self) -> Destination {
        let token = non_blank(&self.telegram_bot_token);
        let chat_id = non_blank(&self.telegram_chat_id);
        match (token, chat_id) {
            (Some(token), Some(chat_id)) => {
                Destination::Telegram(TelegramNotifier::new(token, chat_id))
            }
            (None, None) => Destination::Log(LogNotifier),
            _ => {
                warn!(
                    "Only one of TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID is set, notifications go to the log"
                );
                Destination::Log(LogNotifier)
            }
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// CLI arguments for connection timing and dedup tuning.
#[derive(Debug, Parser)]
#[command(name = "fill-relay")]
#[command(about = "Relay Hyperliquid wallet fills to Telegram")]
pub struct CliConfig {
    /// Seconds between keep-alive pings
    #[arg(long, env = "PING_INTERVAL", default_value_t = 20.0)]
    pub ping_interval: f64,

    /// Seconds without traffic before reconnecting (default: twice the ping interval)
    #[arg(long, env = "PING_TIMEOUT")]
    pub ping_timeout: Option<f64>,

    /// First reconnect delay in seconds
    #[arg(long, env = "RECONNECT_BASE", default_value_t = 1.0)]
    pub reconnect_base: f64,

    /// Upper bound of the reconnect delay in seconds
    #[arg(long, env = "RECONNECT_MAX", default_value_t = 20.0)]
    pub reconnect_max: f64,

    /// Fill keys remembered per wallet
    #[arg(long, env = "DEDUP_CAPACITY", default_value_t = DEFAULT_DEDUP_CAPACITY)]
    pub dedup_capacity: usize,

    /// Don't announce the latest fill of each wallet's first snapshot
    #[arg(long, env = "DISABLE_BASELINE")]
    pub no_baseline: bool,

    /// Notifications buffered for delivery before the oldest are dropped
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            ping_interval: 20.0,
            ping_timeout: None,
            reconnect_base: 1.0,
            reconnect_max: 20.0,
            dedup_capacity: DEFAULT_DEDUP_CAPACITY,
            no_baseline: false,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Combine both sources into the validated relay configuration.
pub fn to_relay_config(env: &EnvConfig, cli: &CliConfig) -> Result<RelayConfig, ConfigError> {
    let raw_url = non_blank(&env.hl_ws_url).ok_or(ConfigError::Missing("HL_WS_URL"))?;
    let endpoint = Url::parse(raw_url).map_err(|source| ConfigError::InvalidUrl {
        value: raw_url.to_string(),
        source,
    })?;
    if !matches!(endpoint.scheme(), "ws" | "wss") {
        return Err(ConfigError::UnsupportedScheme(endpoint.scheme().to_string()));
    }

    let raw_wallets =
        non_blank(&env.wallet_addresses).ok_or(ConfigError::Missing("WALLET_ADDRESSES"))?;
    let wallets = WatchList::parse_csv(raw_wallets);
    if wallets.is_empty() {
        return Err(ConfigError::NoWallets);
    }

    let ping_interval = seconds("ping-interval", cli.ping_interval)?;
    let ping_timeout = match cli.ping_timeout {
        Some(value) => seconds("ping-timeout", value)?,
        None => ping_interval * 2,
    };
    if ping_timeout <= ping_interval {
        return Err(ConfigError::PingTimeoutTooShort);
    }

    let backoff_base = seconds("reconnect-base", cli.reconnect_base)?;
    let backoff_max = seconds("reconnect-max", cli.reconnect_max)?;
    if backoff_base > backoff_max {
        return Err(ConfigError::BackoffRange);
    }

    let dedup_capacity =
        NonZeroUsize::new(cli.dedup_capacity).ok_or(ConfigError::ZeroCapacity("dedup-capacity"))?;
    if cli.queue_capacity == 0 {
        return Err(ConfigError::ZeroCapacity("queue-capacity"));
    }

    Ok(RelayConfig::new(
        endpoint,
        wallets,
        ping_interval,
        ping_timeout,
        backoff_base,
        backoff_max,
        dedup_capacity,
        !cli.no_baseline,
        cli.queue_capacity,
    ))
}

fn seconds(name: &'static str, value: f64) -> Result<Duration, ConfigError> {
    if !(value > 0.0) {
        return Err(ConfigError::InvalidDuration { name, value });
    }
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::InvalidDuration { name, value })
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("HL_WS_URL is not a valid URL ({value}): {source}")]
    InvalidUrl {
        value: String,
        source: url::ParseError,
    },

    #[error("HL_WS_URL must use ws:// or wss://, got {0}://")]
    UnsupportedScheme(String),

    #[error("WALLET_ADDRESSES contains no addresses")]
    NoWallets,

    #[error("{name} must be a positive number of seconds, got {value}")]
    InvalidDuration { name: &'static str, value: f64 },

    #[error("ping-timeout must be greater than ping-interval")]
    PingTimeoutTooShort,

    #[error("reconnect-base must not exceed reconnect-max")]
    BackoffRange,

    #[error("{0} must be greater than zero")]
    ZeroCapacity(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> EnvConfig {
        EnvConfig {
            hl_ws_url: Some("wss://api.hyperliquid.xyz/ws".to_string()),
            wallet_addresses: Some("0xAAA, 0xbbb".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = to_relay_config(&env(), &CliConfig::default()).unwrap();
        assert_eq!(config.endpoint().as_str(), "wss://api.hyperliquid.xyz/ws");
        assert_eq!(config.wallets().len(), 2);
        assert_eq!(config.ping_interval(), Duration::from_secs(20));
        assert_eq!(config.ping_timeout(), Duration::from_secs(40));
        assert_eq!(config.backoff_base(), Duration::from_secs(1));
        assert_eq!(config.backoff_max(), Duration::from_secs(20));
        assert_eq!(config.dedup_capacity().get(), 4000);
        assert!(config.announce_baseline());
    }

    #[test]
    fn test_cli_parsing() {
        let cli = CliConfig::try_parse_from([
            "fill-relay",
            "--ping-interval",
            "5",
            "--ping-timeout",
            "7.5",
            "--dedup-capacity",
            "10",
            "--no-baseline",
        ])
        .unwrap();
        let config = to_relay_config(&env(), &cli).unwrap();
        assert_eq!(config.ping_interval(), Duration::from_secs(5));
        assert_eq!(config.ping_timeout(), Duration::from_millis(7500));
        assert_eq!(config.dedup_capacity().get(), 10);
        assert!(!config.announce_baseline());
    }

    #[test]
    fn test_missing_endpoint() {
        let env = EnvConfig {
            hl_ws_url: Some("  ".to_string()),
            ..env()
        };
        assert!(matches!(
            to_relay_config(&env, &CliConfig::default()),
            Err(ConfigError::Missing("HL_WS_URL"))
        ));
    }

    #[test]
    fn test_missing_or_empty_wallets() {
        let missing = EnvConfig {
            wallet_addresses: None,
            ..env()
        };
        assert!(matches!(
            to_relay_config(&missing, &CliConfig::default()),
            Err(ConfigError::Missing("WALLET_ADDRESSES"))
        ));

        let empty = EnvConfig {
            wallet_addresses: Some(" , ,".to_string()),
            ..env()
        };
        assert!(matches!(
            to_relay_config(&empty, &CliConfig::default()),
            Err(ConfigError::NoWallets)
        ));
    }

    #[test]
    fn test_bad_endpoint() {
        let http = EnvConfig {
            hl_ws_url: Some("https://api.hyperliquid.xyz/ws".to_string()),
            ..env()
        };
        assert!(matches!(
            to_relay_config(&http, &CliConfig::default()),
            Err(ConfigError::UnsupportedScheme(_))
        ));

        let garbage = EnvConfig {
            hl_ws_url: Some("not a url".to_string()),
            ..env()
        };
        assert!(matches!(
            to_relay_config(&garbage, &CliConfig::default()),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_timing_validation() {
        let short_timeout = CliConfig {
            ping_interval: 10.0,
            ping_timeout: Some(10.0),
            ..Default::default()
        };
        assert!(matches!(
            to_relay_config(&env(), &short_timeout),
            Err(ConfigError::PingTimeoutTooShort)
        ));

        let inverted = CliConfig {
            reconnect_base: 30.0,
            reconnect_max: 5.0,
            ..Default::default()
        };
        assert!(matches!(
            to_relay_config(&env(), &inverted),
            Err(ConfigError::BackoffRange)
        ));

        for value in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let cli = CliConfig {
                reconnect_base: value,
                ..Default::default()
            };
            assert!(matches!(
                to_relay_config(&env(), &cli),
                Err(ConfigError::InvalidDuration { name: "reconnect-base", .. })
            ));
        }

        let zero = CliConfig {
            dedup_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            to_relay_config(&env(), &zero),
            Err(ConfigError::ZeroCapacity("dedup-capacity"))
        ));
    }

    #[test]
    fn test_destination() {
        assert!(matches!(env().destination(), Destination::Log(_)));

        let telegram = EnvConfig {
            telegram_bot_token: Some("123:abc".to_string()),
            telegram_chat_id: Some("42".to_string()),
            ..env()
        };
        assert!(matches!(telegram.destination(), Destination::Telegram(_)));

        let partial = EnvConfig {
            telegram_chat_id: Some("42".to_string()),
            ..env()
        };
        assert!(matches!(partial.destination(), Destination::Log(_)));
    }
}
