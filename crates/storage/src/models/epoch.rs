//! The `epochs` table.

use epoch_indexer_types::Epoch;
use reth_codecs::Compact;
use reth_db_api::table::Table;
use serde::{Deserialize, Serialize};

/// Stored epoch bounds, keyed by epoch number in [`Epochs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Compact)]
pub(crate) struct EpochRow {
    /// Creation time of the epoch's first block.
    pub(crate) start_time: u64,
    /// `start_time` plus the epoch duration.
    pub(crate) end_time: u64,
}

impl From<&Epoch> for EpochRow {
    fn from(epoch: &Epoch) -> Self {
        Self { start_time: epoch.start_time, end_time: epoch.end_time }
    }
}

/// Epoch bounds by epoch number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub(crate) struct Epochs;

impl Table for Epochs {
    const NAME: &'static str = "epochs";
    const DUPSORT: bool = false;
    type Key = u64;
    type Value = EpochRow;
}
