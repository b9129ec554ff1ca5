use std::fmt;

use itertools::Itertools;

/// Lowercased wallet address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Trims and lowercases `raw`. Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wallets watched for the whole process lifetime, in subscription order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WatchList {
    wallets: Vec<WalletAddress>,
}

impl WatchList {
    /// Builds the list keeping the first occurrence of every address.
    pub fn new(wallets: impl IntoIterator<Item = WalletAddress>) -> Self {
        Self {
            wallets: wallets.into_iter().unique().collect(),
        }
    }

    /// Parses a comma-separated address list, skipping blank entries.
    pub fn parse_csv(raw: &str) -> Self {
        Self::new(raw.split(',').filter_map(WalletAddress::parse))
    }

    pub fn contains(&self, wallet: &WalletAddress) -> bool {
        self.wallets.contains(wallet)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WalletAddress> {
        self.wallets.iter()
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}

impl<'a> IntoIterator for &'a WatchList {
    type Item = &'a WalletAddress;
    type IntoIter = std::slice::Iter<'a, WalletAddress>;

    fn into_iter(self) -> Self::IntoIter {
        self.wallets.iter()
    }
}
