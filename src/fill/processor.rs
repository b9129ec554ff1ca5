use std::{fmt, num::NonZeroUsize};

use tracing::debug;

use super::{BaselineTracker, DedupCache, key};
use crate::{
    DEFAULT_SNAPSHOT_WINDOW,
    types::{Fill, FillsUpdate, WalletAddress},
};

/// Why a fill is being reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertKind {
    /// Most recent fill of the first snapshot for a wallet.
    Baseline,
    /// New fill from a live update.
    Live,
}

/// A fill selected for notification.
#[derive(Clone, Debug, PartialEq)]
pub struct Alert {
    pub wallet: WalletAddress,
    pub kind: AlertKind,
    pub fill: Fill,
}

/// Notification text of the alert.
impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AlertKind::Baseline => write!(f, "HL {} baseline -> {}", self.wallet, self.fill),
            AlertKind::Live => write!(f, "HL {} -> {}", self.wallet, self.fill),
        }
    }
}

/// Fill processor - pure logic, no async.
///
/// Holds the dedup and baseline state for the whole process lifetime; it is
/// not reset when the feed reconnects.
#[derive(Debug)]
pub struct FillProcessor {
    dedup: DedupCache,
    baseline: BaselineTracker,
    announce_baseline: bool,
    snapshot_window: usize,
}

impl FillProcessor {
    pub fn new(dedup_capacity: NonZeroUsize, announce_baseline: bool) -> Self {
        Self {
            dedup: DedupCache::new(dedup_capacity),
            baseline: BaselineTracker::new(),
            announce_baseline,
            snapshot_window: DEFAULT_SNAPSHOT_WINDOW,
        }
    }

    /// Number of trailing fills of a repeated snapshot recorded as seen.
    pub fn with_snapshot_window(mut self, window: usize) -> Self {
        self.snapshot_window = window;
        self
    }

    pub fn dedup(&self) -> &DedupCache {
        &self.dedup
    }

    pub fn baseline(&self) -> &BaselineTracker {
        &self.baseline
    }

    /// Select the fills of `update` that should be reported, in feed order.
    pub fn process(&mut self, update: &FillsUpdate) -> Vec<Alert> {
        if update.is_snapshot {
            self.process_snapshot(update).into_iter().collect()
        } else {
            self.process_live(update)
        }
    }

    fn process_snapshot(&mut self, update: &FillsUpdate) -> Option<Alert> {
        let wallet = &update.wallet;
        let first = self.baseline.should_announce_baseline(wallet);

        if first && self.announce_baseline {
            let last = update.fills.last()?;
            if self.dedup.seen(wallet, key(wallet, last)) {
                debug!(%wallet, tid = ?last.tid, "Baseline fill already reported");
                return None;
            }
            return Some(Alert {
                wallet: wallet.clone(),
                kind: AlertKind::Baseline,
                fill: last.clone(),
            });
        }

        let skip = update.fills.len().saturating_sub(self.snapshot_window);
        for fill in &update.fills[skip..] {
            self.dedup.seen(wallet, key(wallet, fill));
        }
        debug!(
            %wallet,
            fills = update.fills.len(),
            absorbed = update.fills.len() - skip,
            "Snapshot absorbed without alert"
        );
        None
    }

    fn process_live(&mut self, update: &FillsUpdate) -> Vec<Alert> {
        let wallet = &update.wallet;
        let mut alerts = Vec::new();
        for fill in &update.fills {
            let fill_key = key(wallet, fill);
            if self.dedup.seen(wallet, fill_key) {
                debug!(%wallet, tid = ?fill.tid, "Duplicate fill suppressed");
                continue;
            }
            alerts.push(Alert {
                wallet: wallet.clone(),
                kind: AlertKind::Live,
                fill: fill.clone(),
            });
        }
        alerts
    }
}
