//! The `slots` table.

use epoch_indexer_types::{Block, Slot};
use reth_codecs::Compact;
use reth_db_api::table::Table;
use serde::{Deserialize, Serialize};

/// Stored slot bounds and owning epoch, keyed by slot number in [`Slots`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Compact)]
pub(crate) struct SlotRow {
    /// Slot start time.
    pub(crate) start_time: u64,
    /// Slot end time.
    pub(crate) end_time: u64,
    /// The epoch the slot belongs to.
    pub(crate) epoch_number: u64,
}

impl SlotRow {
    /// Rebuilds the [`Slot`] stored under `slot_number` with its joined `block`.
    pub(crate) const fn into_slot(self, slot_number: u64, block: Block) -> Slot {
        Slot {
            slot_number,
            start_time: self.start_time,
            end_time: self.end_time,
            epoch_number: self.epoch_number,
            block,
        }
    }
}

impl From<&Slot> for SlotRow {
    fn from(slot: &Slot) -> Self {
        Self {
            start_time: slot.start_time,
            end_time: slot.end_time,
            epoch_number: slot.epoch_number,
        }
    }
}

/// Slots by slot number.
///
/// Slots reference their epoch through [`SlotRow::epoch_number`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub(crate) struct Slots;

impl Table for Slots {
    const NAME: &'static str = "slots";
    const DUPSORT: bool = false;
    type Key = u64;
    type Value = SlotRow;
}
