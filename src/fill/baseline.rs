use std::collections::HashSet;

use crate::types::WalletAddress;

/// One-shot per-wallet latch for the baseline announcement.
#[derive(Debug, Default)]
pub struct BaselineTracker {
    latched: HashSet<WalletAddress>,
}

impl BaselineTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` on the first call for `wallet`, `false` on every later call.
    pub fn should_announce_baseline(&mut self, wallet: &WalletAddress) -> bool {
        if self.latched.contains(wallet) {
            return false;
        }
        self.latched.insert(wallet.clone());
        true
    }

    /// Whether the latch for `wallet` is already consumed.
    pub fn is_latched(&self, wallet: &WalletAddress) -> bool {
        self.latched.contains(wallet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latches_once_per_wallet() {
        let mut tracker = BaselineTracker::new();
        let a = WalletAddress::parse("0xa").unwrap();
        let b = WalletAddress::parse("0xb").unwrap();

        assert!(!tracker.is_latched(&a));
        assert!(tracker.should_announce_baseline(&a));
        for _ in 0..5 {
            assert!(!tracker.should_announce_baseline(&a));
        }
        assert!(tracker.is_latched(&a));

        assert!(tracker.should_announce_baseline(&b));
        assert!(!tracker.should_announce_baseline(&b));
    }
}
