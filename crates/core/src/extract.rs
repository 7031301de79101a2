//! Conversion of a notified block into a [`Block`] record.

use crate::AggregationError;
use epoch_indexer_source::{BlockEvent, PayloadError, SignedBeaconBlock};
use epoch_indexer_types::Block;
use tracing::warn;

/// Builds the [`Block`] for a notification from its signed block body.
///
/// A body whose version has no known execution payload yields a degraded block: roots and slot
/// are kept, every execution field is zero and [`Block::degraded`] is set. A body proposed in a
/// different slot than the notification is rejected.
pub fn block_from_signed(
    event: &BlockEvent,
    signed: &SignedBeaconBlock,
) -> Result<Block, AggregationError> {
    let slot = event.slot;
    if signed.slot() != slot {
        return Err(AggregationError::SlotMismatch { slot, block_slot: signed.slot() });
    }
    let block_root = event.block.to_string();
    let state_root = signed.state_root().to_string();

    match signed.execution_payload().and_then(|payload| payload.summary()) {
        Ok(summary) => Ok(Block {
            block_number: summary.block_number,
            block_root,
            state_root,
            slot_number: slot,
            gas_limit: summary.gas_limit,
            gas_used: summary.gas_used,
            no_of_transactions: summary.transaction_count,
            created_at: summary.timestamp,
            degraded: false,
        }),
        Err(PayloadError::UnsupportedVersion(version)) => {
            warn!(
                target: "aggregator",
                slot,
                %version,
                "Unsupported execution payload version, storing degraded block"
            );
            Ok(Block::degraded(slot, block_root, state_root))
        }
        Err(source) => Err(AggregationError::Payload { slot, source }),
    }
}
