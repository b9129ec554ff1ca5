use std::{collections::HashMap, num::NonZeroUsize};

use lru::LruCache;

use crate::types::{FillKey, WalletAddress};

/// Per-wallet bounded set of already reported fill keys.
///
/// Each wallet gets its own LRU of `capacity` keys, created on first use.
/// Keys leave a set only through eviction of the least recently accessed key;
/// a lookup counts as an access.
#[derive(Debug)]
pub struct DedupCache {
    capacity: NonZeroUsize,
    wallets: HashMap<WalletAddress, LruCache<FillKey, ()>>,
}

impl DedupCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            wallets: HashMap::new(),
        }
    }

    /// Returns `true` if `key` was already recorded for `wallet`, refreshing
    /// its recency. Otherwise records it and returns `false`.
    pub fn seen(&mut self, wallet: &WalletAddress, key: FillKey) -> bool {
        let capacity = self.capacity;
        let keys = self
            .wallets
            .entry(wallet.clone())
            .or_insert_with(|| LruCache::new(capacity));
        if keys.get(&key).is_some() {
            return true;
        }
        keys.put(key, ());
        false
    }

    /// Checks membership without recording or refreshing anything.
    pub fn contains(&self, wallet: &WalletAddress, key: &FillKey) -> bool {
        self.wallets
            .get(wallet)
            .is_some_and(|keys| keys.contains(key))
    }

    /// Number of keys currently held for `wallet`.
    pub fn len(&self, wallet: &WalletAddress) -> usize {
        self.wallets.get(wallet).map_or(0, |keys| keys.len())
    }
}
