use serde::Serialize;

use super::WalletAddress;

/// Outbound subscription request.
///
/// Serializes to
/// `{"method":"subscribe","subscription":{"type":"userFills","user":"0x.."}}`.
#[derive(Clone, Debug, Serialize)]
pub struct SubscribeRequest<'a> {
    method: &'static str,
    subscription: Subscription<'a>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum Subscription<'a> {
    UserFills { user: &'a str },
}

impl<'a> SubscribeRequest<'a> {
    pub fn user_fills(wallet: &'a WalletAddress) -> Self {
        Self {
            method: "subscribe",
            subscription: Subscription::UserFills {
                user: wallet.as_str(),
            },
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
