//! Contains the [`Slot`] type.

use crate::Block;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single scheduling unit of the chain with its observed [`Block`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    /// The slot number.
    pub slot_number: u64,
    /// Slot start in Unix seconds, taken from the block's creation time.
    #[serde(with = "crate::rfc3339")]
    pub start_time: u64,
    /// Slot end, `start_time` plus the slot duration.
    #[serde(with = "crate::rfc3339")]
    pub end_time: u64,
    /// The epoch this slot belongs to.
    pub epoch_number: u64,
    /// The block produced in this slot.
    pub block: Block,
}

impl Slot {
    /// Creates a [`Slot`] that starts when its block was created.
    pub fn new(epoch_number: u64, slot_duration: Duration, block: Block) -> Self {
        let start_time = block.created_at;
        Self {
            slot_number: block.slot_number,
            start_time,
            end_time: start_time.saturating_add(slot_duration.as_secs()),
            epoch_number,
            block,
        }
    }
}
