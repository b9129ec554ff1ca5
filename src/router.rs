//! Classification of inbound feed frames.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{Fill, FillsUpdate, WalletAddress, WatchList};

const CHANNEL_SUBSCRIPTION_RESPONSE: &str = "subscriptionResponse";
const CHANNEL_USER_FILLS: &str = "userFills";

/// Outcome of classifying a single inbound frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    /// Malformed, unknown or out-of-scope frame.
    Ignored,
    /// Acknowledgement of a subscribe request.
    SubscriptionAck,
    /// Fills for a watched wallet.
    FillsUpdate(FillsUpdate),
}

#[derive(Deserialize)]
struct RawFrame {
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserFillsData {
    user: String,
    #[serde(default)]
    is_snapshot: Option<bool>,
    #[serde(default)]
    fills: Option<Vec<Value>>,
}

/// Turns raw text frames into [`Frame`]s for the watched wallets.
#[derive(Clone, Debug)]
pub struct MessageRouter {
    wallets: WatchList,
}

impl MessageRouter {
    pub fn new(wallets: WatchList) -> Self {
        Self { wallets }
    }

    /// Classify `raw`. Never fails: anything unexpected is [`Frame::Ignored`].
    pub fn route(&self, raw: &str) -> Frame {
        let frame: RawFrame = match serde_json::from_str(raw) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(%e, "Dropping unparseable frame");
                return Frame::Ignored;
            }
        };

        match frame.channel.as_deref() {
            Some(CHANNEL_SUBSCRIPTION_RESPONSE) => Frame::SubscriptionAck,
            Some(CHANNEL_USER_FILLS) => self.user_fills(frame.data),
            channel => {
                debug!(?channel, "Dropping frame from unhandled channel");
                Frame::Ignored
            }
        }
    }

    fn user_fills(&self, data: Option<Value>) -> Frame {
        let Some(data) = data.filter(Value::is_object) else {
            debug!("Dropping userFills frame without data");
            return Frame::Ignored;
        };
        let data: UserFillsData = match serde_json::from_value(data) {
            Ok(data) => data,
            Err(e) => {
                debug!(%e, "Dropping malformed userFills frame");
                return Frame::Ignored;
            }
        };
        let Some(wallet) = WalletAddress::parse(&data.user) else {
            debug!("Dropping userFills frame with blank user");
            return Frame::Ignored;
        };
        if !self.wallets.contains(&wallet) {
            warn!(%wallet, "Dropping fills for wallet outside the watch list");
            return Frame::Ignored;
        }

        let fills = data
            .fills
            .unwrap_or_default()
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<Fill>(value) {
                Ok(fill) => Some(fill),
                Err(e) => {
                    debug!(%wallet, %e, "Skipping malformed fill entry");
                    None
                }
            })
            .collect();

        Frame::FillsUpdate(FillsUpdate::new(
            wallet,
            fills,
            data.is_snapshot.unwrap_or(false),
        ))
    }
}
