use crate::{SignedBeaconBlock, SourceError, SseEvent};
use async_trait::async_trait;
use futures::Stream;
use std::{pin::Pin, time::Duration};

/// A stream of raw notifications pushed by an [`EventSource`].
///
/// The stream ends when the source closes the subscription. An `Err` item means delivery
/// failed and no further items will follow.
pub type RawEventStream = Pin<Box<dyn Stream<Item = Result<SseEvent, SourceError>> + Send>>;

/// The consensus client boundary consumed by the epoch aggregator.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Returns the number of slots in one epoch.
    async fn slots_per_epoch(&self) -> Result<u64, SourceError>;

    /// Returns the duration of a single slot.
    async fn slot_duration(&self) -> Result<Duration, SourceError>;

    /// Subscribes to block production notifications.
    async fn subscribe_blocks(&self) -> Result<RawEventStream, SourceError>;

    /// Fetches the signed block body for `block_id`.
    ///
    /// Returns `Ok(None)` when the source has no block for the id.
    async fn signed_block(&self, block_id: &str) -> Result<Option<SignedBeaconBlock>, SourceError>;
}
