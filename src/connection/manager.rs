use std::{future::Future, time::Duration};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{Backoff, ConnectionState, FeedConnection, FeedConnector};
use crate::{
    RelayConfig,
    error::ConnectionError,
    fill::FillProcessor,
    notify::NotificationSender,
    router::{Frame, MessageRouter},
    types::{SubscribeRequest, WatchList},
};

/// Text sent once, the first time the feed starts streaming.
pub fn connected_text(wallets: usize) -> String {
    format!("HL WS connected. Subscribed to userFills for {wallets} wallet(s).")
}

/// Text sent every time a streaming connection is lost.
pub const DISCONNECTED_TEXT: &str = "HL WS disconnected; retrying soon…";

/// Owns the feed connection and all per-process relay state.
///
/// State machine: `Disconnected -> Connecting -> Subscribing -> Streaming`,
/// back to `Disconnected` on any failure. Dedup and baseline state live in
/// the [`FillProcessor`] and survive reconnects.
pub struct ConnectionManager<C, S> {
    connector: C,
    sleep: S,
    wallets: WatchList,
    router: MessageRouter,
    processor: FillProcessor,
    notifications: NotificationSender,
    backoff: Backoff,
    state: watch::Sender<ConnectionState>,
    announced: bool,
}

impl<C, S, SFut> ConnectionManager<C, S>
where
    C: FeedConnector,
    S: Fn(Duration) -> SFut,
    SFut: Future<Output = ()>,
{
    /// `sleep` is used for the backoff delay, typically [`tokio::time::sleep`].
    pub fn new(
        config: &RelayConfig,
        connector: C,
        notifications: NotificationSender,
        sleep: S,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            connector,
            sleep,
            wallets: config.wallets().clone(),
            router: MessageRouter::new(config.wallets().clone()),
            processor: FillProcessor::new(config.dedup_capacity(), config.announce_baseline()),
            notifications,
            backoff: Backoff::new(config.backoff_base(), config.backoff_max()),
            state,
            announced: false,
        }
    }

    /// Watch connection state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn processor(&self) -> &FillProcessor {
        &self.processor
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// Cancellation is observed while connecting, subscribing, streaming and
    /// sleeping between attempts. The open connection, if any, is closed and
    /// nothing is resubscribed.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            self.set_state(ConnectionState::Connecting);
            debug!(attempt, "Connecting to feed");

            let connected = tokio::select! {
                biased;
                _ = shutdown.cancelled() => None,
                result = self.connector.connect() => Some(result),
            };
            let mut conn = match connected {
                None => break,
                Some(Ok(conn)) => conn,
                Some(Err(e)) => {
                    warn!(attempt, %e, "Failed to connect to feed");
                    if !self.back_off(&shutdown).await {
                        break;
                    }
                    continue;
                }
            };

            self.set_state(ConnectionState::Subscribing);
            let subscribed = tokio::select! {
                biased;
                _ = shutdown.cancelled() => None,
                result = self.subscribe_all(&mut conn) => Some(result),
            };
            match subscribed {
                None => {
                    conn.close().await;
                    break;
                }
                Some(Err(e)) => {
                    warn!(attempt, %e, "Failed to subscribe");
                    conn.close().await;
                    if !self.back_off(&shutdown).await {
                        break;
                    }
                    continue;
                }
                Some(Ok(())) => {}
            }

            self.set_state(ConnectionState::Streaming);
            self.backoff.reset();
            attempt = 0;
            info!(wallets = self.wallets.len(), "Streaming fills");
            if !self.announced {
                self.announced = true;
                self.notifications.push(connected_text(self.wallets.len()));
            }

            let ended = tokio::select! {
                biased;
                _ = shutdown.cancelled() => None,
                e = self.stream(&mut conn) => Some(e),
            };
            let Some(e) = ended else {
                conn.close().await;
                break;
            };

            warn!(%e, "Feed connection lost");
            self.notifications.push(DISCONNECTED_TEXT);
            if !self.back_off(&shutdown).await {
                break;
            }
        }

        self.set_state(ConnectionState::Disconnected);
        info!("Connection manager stopped");
    }

    /// Enter `Disconnected` and wait out the backoff delay. Returns `false`
    /// when shutdown was requested.
    async fn back_off(&mut self, shutdown: &CancellationToken) -> bool {
        self.set_state(ConnectionState::Disconnected);
        if shutdown.is_cancelled() {
            return false;
        }
        let delay = self.backoff.next_delay();
        info!(?delay, "Reconnecting after backoff");
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => false,
            _ = (self.sleep)(delay) => true,
        }
    }

    async fn subscribe_all(&self, conn: &mut C::Connection) -> Result<(), ConnectionError> {
        for wallet in &self.wallets {
            let request = SubscribeRequest::user_fills(wallet).to_json()?;
            conn.send(request).await?;
            debug!(%wallet, "Subscribe request sent");
        }
        Ok(())
    }

    /// Consume frames until the connection fails.
    async fn stream(&mut self, conn: &mut C::Connection) -> ConnectionError {
        loop {
            match conn.next_frame().await {
                Ok(raw) => self.dispatch(&raw),
                Err(e) => return e,
            }
        }
    }

    fn dispatch(&mut self, raw: &str) {
        match self.router.route(raw) {
            Frame::Ignored => {}
            Frame::SubscriptionAck => debug!("Subscription acknowledged"),
            Frame::FillsUpdate(update) => {
                for alert in self.processor.process(&update) {
                    info!(
                        wallet = %alert.wallet,
                        kind = ?alert.kind,
                        tid = ?alert.fill.tid,
                        "Reporting fill"
                    );
                    self.notifications.push(alert.to_string());
                }
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }
}
