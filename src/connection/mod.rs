//! Feed connection lifecycle.
//!
//! [`ConnectionManager`] keeps exactly one subscription to the feed alive:
//! it connects, subscribes every watched wallet, streams frames into the
//! [`crate::fill::FillProcessor`] and reconnects with exponential backoff on
//! any failure. It never gives up; the only way out is cancellation.
//!
//! The transport is abstracted behind [`FeedConnector`] /
//! [`FeedConnection`]; [`WsConnector`] is the websocket implementation and
//! [`crate::testing::ScriptedConnector`] a scripted one for tests.

mod backoff;
mod manager;
mod websocket;

use std::future::Future;

use crate::error::ConnectionError;

pub use backoff::Backoff;
pub use manager::{ConnectionManager, DISCONNECTED_TEXT, connected_text};
pub use websocket::{WsConnection, WsConnector};

/// Lifecycle state of the feed connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Subscribing,
    Streaming,
}

/// Opens connections to the feed.
pub trait FeedConnector {
    type Connection: FeedConnection;

    fn connect(&self) -> impl Future<Output = Result<Self::Connection, ConnectionError>> + Send;
}

/// A single open feed connection.
pub trait FeedConnection {
    /// Send a text frame.
    fn send(&mut self, text: String) -> impl Future<Output = Result<(), ConnectionError>> + Send;

    /// Wait for the next text frame. Any error ends the connection.
    fn next_frame(&mut self) -> impl Future<Output = Result<String, ConnectionError>> + Send;

    /// Best-effort graceful close.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
