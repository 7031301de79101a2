//! The windowing state machine.

use crate::{AggregationError, ChainTiming};
use epoch_indexer_types::{Block, Epoch, Slot};

/// The open epoch of an aggregation: its number and the slots buffered for it so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatorState {
    current_epoch: Option<u64>,
    slots: Vec<Slot>,
}

/// The outcome of feeding one observation into an [`AggregatorState`].
#[derive(Debug)]
pub struct Transition {
    /// The state after the observation.
    pub state: AggregatorState,
    /// The epoch closed by the observation, if it crossed a boundary.
    pub epoch: Option<Epoch>,
    /// The error carried by the observation, if it failed.
    pub error: Option<AggregationError>,
}

impl AggregatorState {
    /// The epoch currently being buffered, `None` before the first block.
    pub const fn current_epoch(&self) -> Option<u64> {
        self.current_epoch
    }

    /// The slots buffered for the current epoch.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Applies one observed block, or the error that replaced it.
    ///
    /// A failed observation leaves the state unchanged. A block whose epoch differs from the
    /// open one closes the buffered slots into an [`Epoch`] numbered after the open epoch, and
    /// then starts the new buffer.
    pub fn transition(
        mut self,
        timing: &ChainTiming,
        observed: Result<Block, AggregationError>,
    ) -> Transition {
        let block = match observed {
            Ok(block) => block,
            Err(error) => return Transition { state: self, epoch: None, error: Some(error) },
        };

        let epoch_number = timing.epoch_of(block.slot_number);
        let current = *self.current_epoch.get_or_insert(epoch_number);

        let mut epoch = None;
        if epoch_number != current {
            if !self.slots.is_empty() {
                let slots = std::mem::take(&mut self.slots);
                epoch = Some(Epoch::from_slots(current, timing.epoch_duration(), slots));
            }
            self.current_epoch = Some(epoch_number);
        }
        self.slots.push(Slot::new(epoch_number, timing.slot_duration(), block));

        Transition { state: self, epoch, error: None }
    }
}
