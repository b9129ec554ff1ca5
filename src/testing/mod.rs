//! Scripted feed and test utilities.
//!
//! [`ScriptedConnector`] plays back a list of [`Script`]s, one per connect
//! attempt: either a refused connection or a [`Session`] that yields a fixed
//! sequence of frames and then drops or requests shutdown. Once the script is
//! exhausted the connector cancels the shutdown token, so a
//! [`crate::connection::ConnectionManager`] driven by it always terminates.
//!
//! [`RecordingSleep`] records backoff delays without waiting.
//!
//! [`fill`], [`user_fills`] and [`subscription_ack`] build wire frames.

use std::{
    collections::VecDeque,
    future::{self, Future},
    num::NonZeroUsize,
    sync::{Arc, Mutex},
    time::Duration,
};

use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::{
    DEFAULT_DEDUP_CAPACITY, RelayConfig,
    connection::{FeedConnection, FeedConnector},
    error::ConnectionError,
    types::WatchList,
};

/// What happens once a session has played all its frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// The read fails as if the peer went away.
    Drop,
    /// Shutdown is requested; the read never completes.
    Shutdown,
}

/// One accepted connection.
#[derive(Clone, Debug)]
pub struct Session {
    frames: Vec<String>,
    end: SessionEnd,
    fail_send: bool,
}

impl Session {
    pub fn new(frames: impl IntoIterator<Item = String>, end: SessionEnd) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            end,
            fail_send: false,
        }
    }

    /// Session whose first outbound send fails.
    pub fn failing_send() -> Self {
        Self {
            frames: Vec::new(),
            end: SessionEnd::Drop,
            fail_send: true,
        }
    }
}

/// Outcome of a single connect attempt.
#[derive(Clone, Debug)]
pub enum Script {
    Refuse,
    Accept(Session),
}

/// Observable side effects of the scripted feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Recorded {
    Connect,
    Sent(String),
    Close,
}

#[derive(Clone, Debug)]
pub struct ScriptedConnector {
    scripts: Arc<Mutex<VecDeque<Script>>>,
    log: Arc<Mutex<Vec<Recorded>>>,
    shutdown: CancellationToken,
}

impl ScriptedConnector {
    pub fn new(scripts: impl IntoIterator<Item = Script>, shutdown: CancellationToken) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts.into_iter().collect())),
            log: Arc::new(Mutex::new(Vec::new())),
            shutdown,
        }
    }

    pub fn log(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    /// Payloads sent over all connections, in order.
    pub fn sent(&self) -> Vec<String> {
        self.log()
            .into_iter()
            .filter_map(|r| match r {
                Recorded::Sent(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Number of connect attempts, including refused ones.
    pub fn connects(&self) -> usize {
        self.log()
            .iter()
            .filter(|r| **r == Recorded::Connect)
            .count()
    }

    fn record(&self, entry: Recorded) {
        self.log.lock().unwrap().push(entry);
    }
}

impl FeedConnector for ScriptedConnector {
    type Connection = ScriptedConnection;

    async fn connect(&self) -> Result<ScriptedConnection, ConnectionError> {
        let next = self.scripts.lock().unwrap().pop_front();
        let Some(script) = next else {
            self.shutdown.cancel();
            return Err(ConnectionError::Closed);
        };
        self.record(Recorded::Connect);
        match script {
            Script::Refuse => Err(ConnectionError::ConnectTimeout(Duration::ZERO)),
            Script::Accept(session) => Ok(ScriptedConnection {
                frames: session.frames.into(),
                end: session.end,
                fail_send: session.fail_send,
                log: self.log.clone(),
                shutdown: self.shutdown.clone(),
            }),
        }
    }
}

#[derive(Debug)]
pub struct ScriptedConnection {
    frames: VecDeque<String>,
    end: SessionEnd,
    fail_send: bool,
    log: Arc<Mutex<Vec<Recorded>>>,
    shutdown: CancellationToken,
}

impl FeedConnection for ScriptedConnection {
    async fn send(&mut self, text: String) -> Result<(), ConnectionError> {
        if self.fail_send {
            return Err(ConnectionError::Closed);
        }
        self.log.lock().unwrap().push(Recorded::Sent(text));
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<String, ConnectionError> {
        if let Some(frame) = self.frames.pop_front() {
            return Ok(frame);
        }
        match self.end {
            SessionEnd::Drop => Err(ConnectionError::Closed),
            SessionEnd::Shutdown => {
                self.shutdown.cancel();
                future::pending().await
            }
        }
    }

    async fn close(&mut self) {
        self.log.lock().unwrap().push(Recorded::Close);
    }
}

/// Sleep replacement that records requested delays and returns immediately.
#[derive(Clone, Debug, Default)]
pub struct RecordingSleep {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeper(&self) -> impl Fn(Duration) -> future::Ready<()> + use<> {
        let delays = self.delays.clone();
        move |delay| {
            delays.lock().unwrap().push(delay);
            future::ready(())
        }
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

/// Relay settings for tests: 1 s base backoff capped at 8 s.
pub fn config(wallets: &str) -> RelayConfig {
    RelayConfig::new(
        "ws://127.0.0.1:1/ws".parse().expect("static url"),
        WatchList::parse_csv(wallets),
        Duration::from_secs(20),
        Duration::from_secs(40),
        Duration::from_secs(1),
        Duration::from_secs(8),
        NonZeroUsize::new(DEFAULT_DEDUP_CAPACITY).expect("non-zero"),
        true,
        64,
    )
}

/// Fill JSON object with the given trade ID.
pub fn fill(tid: u64) -> Value {
    json!({
        "coin": "BTC",
        "px": "64000.0",
        "sz": "0.01",
        "side": "B",
        "time": 1_700_000_000_000u64 + tid,
        "hash": format!("0x{tid:064x}"),
        "oid": tid * 10,
        "crossed": true,
        "fee": "0.1",
        "feeToken": "USDC",
        "tid": tid,
    })
}

/// `userFills` frame for `wallet`.
pub fn user_fills(wallet: &str, is_snapshot: bool, fills: impl IntoIterator<Item = Value>) -> String {
    json!({
        "channel": "userFills",
        "data": {
            "user": wallet,
            "isSnapshot": is_snapshot,
            "fills": fills.into_iter().collect::<Vec<_>>(),
        }
    })
    .to_string()
}

/// Subscription acknowledgement frame for `wallet`.
pub fn subscription_ack(wallet: &str) -> String {
    json!({
        "channel": "subscriptionResponse",
        "data": {
            "method": "subscribe",
            "subscription": { "type": "userFills", "user": wallet }
        }
    })
    .to_string()
}

/// Runs `fut` to completion or panics after `limit`.
pub async fn within<F: Future>(limit: Duration, fut: F) -> F::Output {
    tokio::time::timeout(limit, fut)
        .await
        .expect("future did not complete in time")
}
