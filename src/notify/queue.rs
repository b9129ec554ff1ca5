use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tracing::warn;

/// Create a notification queue holding at least `capacity` pending messages.
///
/// Backed by a broadcast channel with a single receiver, which gives
/// non-blocking sends that overwrite the oldest message once full.
pub fn channel(capacity: usize) -> (NotificationSender, NotificationReceiver) {
    let (tx, rx) = broadcast::channel(capacity.max(1));
    (NotificationSender { tx }, NotificationReceiver { rx })
}

/// Producer side of the notification queue.
#[derive(Clone, Debug)]
pub struct NotificationSender {
    tx: broadcast::Sender<String>,
}

impl NotificationSender {
    /// Enqueue `text` without waiting.
    pub fn push(&self, text: impl Into<String>) {
        if self.tx.send(text.into()).is_err() {
            warn!("Notification dropped, delivery worker is gone");
        }
    }
}

/// Consumer side of the notification queue.
#[derive(Debug)]
pub struct NotificationReceiver {
    rx: broadcast::Receiver<String>,
}

impl NotificationReceiver {
    /// Next pending message, or `None` once all senders are dropped and the
    /// queue is drained.
    pub async fn recv(&mut self) -> Option<String> {
        loop {
            match self.rx.recv().await {
                Ok(text) => return Some(text),
                Err(RecvError::Lagged(dropped)) => {
                    warn!(dropped, "Notification queue overflow, oldest messages dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next pending message if one is ready.
    pub fn try_recv(&mut self) -> Option<String> {
        loop {
            match self.rx.try_recv() {
                Ok(text) => return Some(text),
                Err(TryRecvError::Lagged(dropped)) => {
                    warn!(dropped, "Notification queue overflow, oldest messages dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drain everything currently queued.
    pub fn drain(&mut self) -> Vec<String> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
