//! Websocket transport with keep-alive.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::{
    net::TcpStream,
    time::{self, Instant, Interval, MissedTickBehavior},
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, trace};
use url::Url;

use super::{FeedConnection, FeedConnector};
use crate::error::ConnectionError;

/// Opens websocket connections to the feed endpoint.
#[derive(Clone, Debug)]
pub struct WsConnector {
    url: Url,
    ping_interval: Duration,
    ping_timeout: Duration,
}

impl WsConnector {
    /// `ping_timeout` also bounds the opening handshake.
    pub fn new(url: Url, ping_interval: Duration, ping_timeout: Duration) -> Self {
        Self {
            url,
            ping_interval,
            ping_timeout,
        }
    }
}

impl FeedConnector for WsConnector {
    type Connection = WsConnection;

    async fn connect(&self) -> Result<WsConnection, ConnectionError> {
        let (stream, resp) = time::timeout(self.ping_timeout, connect_async(self.url.as_str()))
            .await
            .map_err(|_| ConnectionError::ConnectTimeout(self.ping_timeout))??;
        debug!(url = %self.url, status = %resp.status(), "Websocket handshake complete");
        Ok(WsConnection::new(stream, self.ping_interval, self.ping_timeout))
    }
}

/// Live websocket connection.
///
/// Sends a ping every `ping_interval` and fails the read once nothing at all
/// has been received for `ping_timeout`. Inbound pings are answered by
/// tungstenite on the next read.
#[derive(derive_more::Debug)]
pub struct WsConnection {
    #[debug(skip)]
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    #[debug(skip)]
    ping: Interval,
    last_seen: Instant,
    ping_timeout: Duration,
}

enum Wake {
    Message(Option<Result<Message, tokio_tungstenite::tungstenite::Error>>),
    Ping,
    Silent,
}

impl WsConnection {
    fn new(
        stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
        ping_interval: Duration,
        ping_timeout: Duration,
    ) -> Self {
        let now = Instant::now();
        let mut ping = time::interval_at(now + ping_interval, ping_interval);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            stream,
            ping,
            last_seen: now,
            ping_timeout,
        }
    }
}

impl FeedConnection for WsConnection {
    async fn send(&mut self, text: String) -> Result<(), ConnectionError> {
        self.stream.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<String, ConnectionError> {
        loop {
            let deadline = self.last_seen + self.ping_timeout;
            let wake = tokio::select! {
                msg = self.stream.next() => Wake::Message(msg),
                _ = self.ping.tick() => Wake::Ping,
                _ = time::sleep_until(deadline) => Wake::Silent,
            };

            match wake {
                Wake::Ping => {
                    trace!("Sending keep-alive ping");
                    time::timeout_at(deadline, self.stream.send(Message::Ping(Vec::new())))
                        .await
                        .map_err(|_| ConnectionError::PingTimeout(self.ping_timeout))??;
                }
                Wake::Silent => return Err(ConnectionError::PingTimeout(self.ping_timeout)),
                Wake::Message(None) => return Err(ConnectionError::Closed),
                Wake::Message(Some(Err(e))) => return Err(e.into()),
                Wake::Message(Some(Ok(msg))) => {
                    self.last_seen = Instant::now();
                    match msg {
                        Message::Text(text) => return Ok(text),
                        Message::Binary(bytes) => match String::from_utf8(bytes) {
                            Ok(text) => return Ok(text),
                            Err(_) => debug!("Dropping non UTF-8 binary frame"),
                        },
                        Message::Close(frame) => {
                            debug!(?frame, "Peer sent close frame");
                            return Err(ConnectionError::Closed);
                        }
                        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
                    }
                }
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(%e, "Error while closing websocket");
        }
    }
}
