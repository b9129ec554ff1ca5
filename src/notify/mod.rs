//! Notification delivery.
//!
//! The feed side only ever pushes text onto a [`NotificationSender`]; a
//! separate task runs [`run_delivery`] to hand each message to a
//! [`Notifier`]. Pushing never blocks: when the queue is full the oldest
//! pending message is dropped.
//!
//! # Example
//!
//! ```ignore
//! let (tx, rx) = notify::channel(256);
//! let worker = tokio::spawn(notify::run_delivery(rx, LogNotifier));
//!
//! tx.push("hello");
//! drop(tx);
//! worker.await?;
//! ```

mod queue;
mod telegram;

use std::future::Future;

use tracing::{info, warn};

use crate::error::DeliveryError;

pub use queue::{NotificationReceiver, NotificationSender, channel};
pub use telegram::TelegramNotifier;

/// Delivers a single text message.
pub trait Notifier {
    fn send(&self, text: &str) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> Result<(), DeliveryError> {
        info!(target: "notify", "{text}");
        Ok(())
    }
}

/// Configured notification destination.
#[derive(Clone, Debug)]
pub enum Destination {
    Telegram(TelegramNotifier),
    Log(LogNotifier),
}

impl Notifier for Destination {
    async fn send(&self, text: &str) -> Result<(), DeliveryError> {
        match self {
            Destination::Telegram(telegram) => telegram.send(text).await,
            Destination::Log(log) => log.send(text).await,
        }
    }
}

/// Drain `rx` into `notifier` until every sender is dropped.
///
/// Delivery failures are logged and the message is discarded.
pub async fn run_delivery<N: Notifier>(mut rx: NotificationReceiver, notifier: N) {
    while let Some(text) = rx.recv().await {
        if let Err(e) = notifier.send(&text).await {
            warn!(%e, "Notification delivery failed");
        }
    }
    info!("Notification queue closed, delivery stopped");
}
