//! Hyperliquid wallet fill relay.
//!
//! # Overview
//!
//! Watches a fixed set of wallets on the `userFills` websocket channel and
//! turns every new fill into a short text notification.
//!
//! Use [`connection::ConnectionManager`] to keep the subscription alive and
//! feed inbound frames through [`router::MessageRouter`] and
//! [`fill::FillProcessor`]. Produced alerts are pushed onto a
//! notification queue ([`notify::channel`]) drained by [`notify::run_delivery`], so a slow
//! notification endpoint never stalls the feed.
//!
//! # Deduplication
//!
//! Each fill gets a [`types::FillKey`]. Keys are remembered per wallet in a
//! bounded LRU set that survives reconnects, so a fill is reported at most once
//! per process lifetime (as long as it has not been evicted). The first
//! snapshot received for a wallet produces a single "baseline" alert for its
//! most recent fill. Later snapshots are absorbed silently.
//!
//! # Limitations
//!
//! * Dedup state lives in memory only and is lost on restart.
//!
//! * Fills missed while disconnected are not backfilled.
//!
//! * Fills without `tid` and `hash` are keyed by their visible fields, which
//!   can collide for two equal fills executed at the same millisecond.
//!
//! # Testing
//!
//! [`testing`] module provides a scripted feed connector and frame builders
//! to drive [`connection::ConnectionManager`] without a network.

pub mod connection;
pub mod error;
pub mod fill;
pub mod notify;
pub mod router;
pub mod testing;
pub mod types;

use std::{num::NonZeroUsize, time::Duration};

use url::Url;

use crate::types::WatchList;

/// Default number of fill keys remembered per wallet.
pub const DEFAULT_DEDUP_CAPACITY: usize = 4000;

/// Default number of trailing snapshot fills absorbed after the baseline.
pub const DEFAULT_SNAPSHOT_WINDOW: usize = 5;

/// Default number of notifications waiting for delivery.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Validated, immutable relay settings.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    endpoint: Url,
    wallets: WatchList,
    ping_interval: Duration,
    ping_timeout: Duration,
    backoff_base: Duration,
    backoff_max: Duration,
    dedup_capacity: NonZeroUsize,
    announce_baseline: bool,
    queue_capacity: usize,
}

impl RelayConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        endpoint: Url,
        wallets: WatchList,
        ping_interval: Duration,
        ping_timeout: Duration,
        backoff_base: Duration,
        backoff_max: Duration,
        dedup_capacity: NonZeroUsize,
        announce_baseline: bool,
        queue_capacity: usize,
    ) -> Self {
        Self {
            endpoint,
            wallets,
            ping_interval,
            ping_timeout,
            backoff_base,
            backoff_max,
            dedup_capacity,
            announce_baseline,
            queue_capacity,
        }
    }

    /// Websocket endpoint of the feed.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn wallets(&self) -> &WatchList {
        &self.wallets
    }

    pub fn ping_interval(&self) -> Duration {
        self.ping_interval
    }

    /// Silence longer than this fails the connection.
    pub fn ping_timeout(&self) -> Duration {
        self.ping_timeout
    }

    pub fn backoff_base(&self) -> Duration {
        self.backoff_base
    }

    pub fn backoff_max(&self) -> Duration {
        self.backoff_max
    }

    /// Maximum number of fill keys remembered per wallet.
    pub fn dedup_capacity(&self) -> NonZeroUsize {
        self.dedup_capacity
    }

    /// Whether the first snapshot of each wallet is announced.
    pub fn announce_baseline(&self) -> bool {
        self.announce_baseline
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }
}
