use alloy_primitives::B256;
use epoch_indexer_source::{EventDecodeError, PayloadError, SourceError};
use thiserror::Error;

/// Errors reported on an [`EpochAggregator`](crate::EpochAggregator) subscription.
///
/// Only [`AggregationError::is_terminal`] errors end the subscription. Every other error skips
/// the event that caused it and leaves the open epoch untouched.
#[derive(Debug, Error)]
pub enum AggregationError {
    /// Slots per epoch or the slot duration could not be resolved.
    #[error("failed to resolve chain timing: {0}")]
    ChainSpec(#[source] SourceError),

    /// A notification could not be decoded.
    #[error("failed to decode block event: {0}")]
    Decode(#[from] EventDecodeError),

    /// The execution payload of a block body could not be read.
    #[error("failed to read execution payload of slot {slot}: {source}")]
    Payload {
        /// The slot of the block.
        slot: u64,
        /// The underlying payload error.
        #[source]
        source: PayloadError,
    },

    /// The source has no block body for a notified block.
    #[error("no block found for slot {slot} with root {block_root}")]
    BlockNotFound {
        /// The notified slot.
        slot: u64,
        /// The notified block root.
        block_root: B256,
    },

    /// Fetching the block body failed.
    #[error("failed to fetch block for slot {slot}: {source}")]
    Lookup {
        /// The notified slot.
        slot: u64,
        /// The underlying source error.
        #[source]
        source: SourceError,
    },

    /// The block body returned for a notification belongs to another slot.
    #[error("block for slot {slot} was proposed in slot {block_slot}")]
    SlotMismatch {
        /// The notified slot.
        slot: u64,
        /// The slot carried by the block body.
        block_slot: u64,
    },

    /// Subscribing failed or the subscription broke.
    #[error("block event subscription failed: {0}")]
    Subscription(#[source] SourceError),

    /// The source closed the subscription.
    #[error("block event stream closed")]
    StreamClosed,
}

impl AggregationError {
    /// Whether the error happened before any event was processed.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::ChainSpec(_))
    }

    /// Whether the subscription ends after reporting this error.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::ChainSpec(_) | Self::Subscription(_) | Self::StreamClosed)
    }

    /// A short label for metrics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ChainSpec(_) => "chain_spec",
            Self::Decode(_) | Self::Payload { .. } => "decode",
            Self::BlockNotFound { .. } | Self::Lookup { .. } | Self::SlotMismatch { .. } => {
                "lookup"
            }
            Self::Subscription(_) | Self::StreamClosed => "stream",
        }
    }
}
