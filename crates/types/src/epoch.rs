//! Contains the [`Epoch`] type.

use crate::Slot;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A completed window of slots.
///
/// Slots are ordered by increasing slot number and all share the epoch's number.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Epoch {
    /// The epoch number.
    pub epoch_number: u64,
    /// Creation time of the first slot's block, in Unix seconds.
    #[serde(with = "crate::rfc3339")]
    pub start_time: u64,
    /// `start_time` plus the epoch duration.
    #[serde(with = "crate::rfc3339")]
    pub end_time: u64,
    /// The slots observed in this epoch.
    pub slots: Vec<Slot>,
}

impl Epoch {
    /// Closes a window of buffered slots into an [`Epoch`].
    ///
    /// The start time is the first slot's block creation time, or zero when `slots` is empty.
    pub fn from_slots(epoch_number: u64, epoch_duration: Duration, slots: Vec<Slot>) -> Self {
        let start_time = slots.first().map(|slot| slot.block.created_at).unwrap_or_default();
        Self {
            epoch_number,
            start_time,
            end_time: start_time.saturating_add(epoch_duration.as_secs()),
            slots,
        }
    }
}
