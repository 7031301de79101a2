#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod rfc3339;

mod block;
pub use block::Block;

mod slot;
pub use slot::Slot;

mod epoch;
pub use epoch::Epoch;

/// Number of most-recent epoch numbers kept durably.
pub const RETENTION_DEPTH: u64 = 5;
