use std::time::Duration;

use tokio_tungstenite::tungstenite;

/// Failure of the feed connection.
///
/// Always recoverable: the connection manager reacts to any of these by
/// backing off and reconnecting.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("connection closed by peer")]
    Closed,

    #[error("no traffic from peer for {0:?}")]
    PingTimeout(Duration),

    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure to deliver a single notification.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// Transport failure. The request URL is stripped since it embeds the
    /// bot token.
    #[error("http error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("rejected with status {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}
