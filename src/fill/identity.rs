use crate::types::{Fill, FillKey, WalletAddress};

/// Derives the dedup key of `fill` for `wallet`.
///
/// Uses `tid` when present, then `hash`, then a composite of
/// `(time, coin, side, px, sz, oid)` with absent parts left empty.
/// Each form carries its own tag so values from different forms never compare
/// equal.
pub fn key(wallet: &WalletAddress, fill: &Fill) -> FillKey {
    if let Some(tid) = &fill.tid {
        return FillKey::new(format!("{wallet}:tid:{tid}"));
    }
    if let Some(hash) = &fill.hash {
        return FillKey::new(format!("{wallet}:hash:{hash}"));
    }
    let time = fill.timestamp.map(|t| t.to_string()).unwrap_or_default();
    FillKey::new(format!(
        "{wallet}:fb:{time}|{}|{}|{}|{}|{}",
        fill.coin.as_deref().unwrap_or_default(),
        fill.side.as_deref().unwrap_or_default(),
        fill.price.as_deref().unwrap_or_default(),
        fill.size.as_deref().unwrap_or_default(),
        fill.oid.as_deref().unwrap_or_default(),
    ))
}
