mod fill;
mod request;
mod wallet;

pub use fill::{Fill, FillKey};
pub use request::SubscribeRequest;
pub use wallet::{WalletAddress, WatchList};

/// Ordered fills of a single `userFills` frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FillsUpdate {
    /// Normalized wallet the fills belong to.
    pub wallet: WalletAddress,

    /// Fills in feed order, oldest first.
    pub fills: Vec<Fill>,

    /// `true` for the replay sent right after subscribing,
    /// `false` for live updates.
    pub is_snapshot: bool,
}

impl FillsUpdate {
    pub fn new(wallet: WalletAddress, fills: Vec<Fill>, is_snapshot: bool) -> Self {
        Self {
            wallet,
            fills,
            is_snapshot,
        }
    }
}
