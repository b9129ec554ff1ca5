//! Fill identity, deduplication and alert selection.
//!
//! Everything in this module is pure, synchronous logic. The async side
//! (reading frames, delivering notifications) lives in
//! [`crate::connection`] and [`crate::notify`].
//!
//! - [`key`] - derives a [`crate::types::FillKey`] for a fill
//! - [`DedupCache`] - bounded per-wallet LRU set of reported keys
//! - [`BaselineTracker`] - one-shot per-wallet baseline latch
//! - [`FillProcessor`] - decides which fills of an update are alerted
//!
//! # Example
//!
//! ```
//! use std::num::NonZeroUsize;
//!
//! use fill_relay::{
//!     fill::FillProcessor,
//!     types::{Fill, FillsUpdate, WalletAddress},
//! };
//!
//! let wallet = WalletAddress::parse("0xabc").unwrap();
//! let mut processor = FillProcessor::new(NonZeroUsize::new(100).unwrap(), true);
//!
//! let fill = Fill { tid: Some("1".into()), ..Default::default() };
//! let update = FillsUpdate::new(wallet.clone(), vec![fill.clone(), fill], false);
//!
//! let alerts = processor.process(&update);
//! assert_eq!(alerts.len(), 1);
//! ```

mod baseline;
mod dedup;
mod identity;
mod processor;

pub use baseline::BaselineTracker;
pub use dedup::DedupCache;
pub use identity::key;
pub use processor::{Alert, AlertKind, FillProcessor};
