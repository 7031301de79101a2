//! In-memory [`EventSource`] and fixtures for tests.

use crate::{EventSource, RawEventStream, SignedBeaconBlock, SourceError, SseEvent};
use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use futures::{StreamExt, stream};
use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
    time::Duration,
};

/// Timestamp of slot zero used by [`MockEventSource::with_chain`].
pub const GENESIS_TIME: u64 = 1_606_824_023;

/// Deterministic block root for `slot`.
pub fn block_root(slot: u64) -> B256 {
    B256::left_padding_from(&slot.to_be_bytes())
}

/// Deterministic state root for `slot`.
pub fn state_root(slot: u64) -> B256 {
    B256::right_padding_from(&slot.to_be_bytes())
}

/// A `block` notification for `slot` carrying [`block_root`].
pub fn block_event(slot: u64) -> SseEvent {
    let data = serde_json::json!({
        "slot": slot.to_string(),
        "block": block_root(slot),
        "execution_optimistic": false,
    });
    SseEvent::new(crate::BLOCK_TOPIC, data.to_string())
}

/// The JSON body of `/eth/v2/beacon/blocks/{id}` for a block of `fork`.
///
/// The payload carries every field up to deneb so it decodes under any known version.
pub fn signed_block_json(
    fork: &str,
    slot: u64,
    block_number: u64,
    timestamp: u64,
    tx_count: usize,
) -> serde_json::Value {
    let transactions: Vec<&str> = vec!["0x02f870"; tx_count];
    serde_json::json!({
        "version": fork,
        "execution_optimistic": false,
        "finalized": false,
        "data": {
            "message": {
                "slot": slot.to_string(),
                "proposer_index": "1",
                "state_root": state_root(slot),
                "body": {
                    "execution_payload": {
                        "block_hash": block_root(block_number),
                        "block_number": block_number.to_string(),
                        "gas_limit": "30000000",
                        "gas_used": "15000000",
                        "timestamp": timestamp.to_string(),
                        "transactions": transactions,
                        "withdrawals": [{
                            "index": "0",
                            "validator_index": "7",
                            "address": Address::with_last_byte(1),
                            "amount": "1000",
                        }],
                        "blob_gas_used": "131072",
                        "excess_blob_gas": "0",
                    }
                }
            },
            "signature": "0x00",
        }
    })
}

/// A decoded [`SignedBeaconBlock`] built from [`signed_block_json`].
pub fn signed_block(
    fork: &str,
    slot: u64,
    block_number: u64,
    timestamp: u64,
    tx_count: usize,
) -> SignedBeaconBlock {
    serde_json::from_value(signed_block_json(fork, slot, block_number, timestamp, tx_count))
        .expect("fixture block decodes")
}

/// An [`EventSource`] serving a scripted notification sequence and a fixed block set.
#[derive(Debug)]
pub struct MockEventSource {
    slots_per_epoch: Option<u64>,
    slot_duration: Duration,
    events: Mutex<Option<Vec<Result<SseEvent, SourceError>>>>,
    keep_open: bool,
    blocks: HashMap<String, SignedBeaconBlock>,
    failing_lookups: HashSet<String>,
}

impl MockEventSource {
    /// Creates a source with the given chain timing and no events.
    pub fn new(slots_per_epoch: u64, slot_duration: Duration) -> Self {
        Self {
            slots_per_epoch: Some(slots_per_epoch),
            slot_duration,
            events: Mutex::new(Some(Vec::new())),
            keep_open: false,
            blocks: HashMap::new(),
            failing_lookups: HashSet::new(),
        }
    }

    /// Makes chain timing resolution fail.
    pub fn without_chain_spec(mut self) -> Self {
        self.slots_per_epoch = None;
        self
    }

    /// Keeps the subscription open after the scripted events instead of ending it.
    pub fn keep_open(mut self) -> Self {
        self.keep_open = true;
        self
    }

    /// Appends a raw notification to the script.
    pub fn with_event(self, event: Result<SseEvent, SourceError>) -> Self {
        if let Ok(mut events) = self.events.lock() {
            events.get_or_insert_with(Vec::new).push(event);
        }
        self
    }

    /// Registers the block body served for `block_id`.
    pub fn with_block(mut self, block_id: impl Into<String>, block: SignedBeaconBlock) -> Self {
        self.blocks.insert(block_id.into(), block);
        self
    }

    /// Makes lookups of `block_id` fail with [`SourceError::Unavailable`].
    pub fn with_failing_lookup(mut self, block_id: impl Into<String>) -> Self {
        self.failing_lookups.insert(block_id.into());
        self
    }

    /// Scripts a notification and a `fork` block for each of `slots`.
    ///
    /// Slot `n` gets execution block number `n + 1000`, a timestamp of
    /// `GENESIS_TIME + n * slot_duration` and one transaction.
    pub fn with_chain(mut self, fork: &str, slots: impl IntoIterator<Item = u64>) -> Self {
        for slot in slots {
            let timestamp = GENESIS_TIME + slot * self.slot_duration.as_secs();
            let block = signed_block(fork, slot, slot + 1000, timestamp, 1);
            self = self
                .with_event(Ok(block_event(slot)))
                .with_block(block_root(slot).to_string(), block);
        }
        self
    }
}

#[async_trait]
impl EventSource for MockEventSource {
    async fn slots_per_epoch(&self) -> Result<u64, SourceError> {
        self.slots_per_epoch.ok_or(SourceError::MissingSpecValue("SLOTS_PER_EPOCH"))
    }

    async fn slot_duration(&self) -> Result<Duration, SourceError> {
        Ok(self.slot_duration)
    }

    async fn subscribe_blocks(&self) -> Result<RawEventStream, SourceError> {
        let events = self
            .events
            .lock()
            .ok()
            .and_then(|mut events| events.take())
            .ok_or_else(|| SourceError::Unavailable("already subscribed".to_string()))?;

        let scripted = stream::iter(events);
        if self.keep_open {
            Ok(scripted.chain(stream::pending()).boxed())
        } else {
            Ok(scripted.boxed())
        }
    }

    async fn signed_block(&self, block_id: &str) -> Result<Option<SignedBeaconBlock>, SourceError> {
        if self.failing_lookups.contains(block_id) {
            return Err(SourceError::Unavailable(format!("lookup of {block_id} failed")));
        }
        Ok(self.blocks.get(block_id).cloned())
    }
}
