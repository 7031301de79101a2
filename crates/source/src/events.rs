//! Block production notifications.

use crate::SseEvent;
use alloy_primitives::B256;
use serde::Deserialize;
use thiserror::Error;

/// The event stream topic carrying block production notifications.
pub const BLOCK_TOPIC: &str = "block";

/// A decoded `block` notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BlockEvent {
    /// The slot the block was produced in.
    #[serde(deserialize_with = "crate::quoted::deserialize")]
    pub slot: u64,
    /// The block root.
    pub block: B256,
    /// Whether the node had only optimistically imported the block.
    #[serde(default)]
    pub execution_optimistic: bool,
}

/// Errors raised while decoding a raw notification.
#[derive(Debug, Error)]
pub enum EventDecodeError {
    /// The frame belongs to a topic other than [`BLOCK_TOPIC`].
    #[error("unexpected event type: {0}")]
    UnexpectedEvent(String),
    /// The frame payload is not a valid block notification.
    #[error("malformed block event: {0}")]
    Json(#[from] serde_json::Error),
}

impl TryFrom<&SseEvent> for BlockEvent {
    type Error = EventDecodeError;

    fn try_from(event: &SseEvent) -> Result<Self, Self::Error> {
        if event.event != BLOCK_TOPIC {
            return Err(EventDecodeError::UnexpectedEvent(event.event.clone()));
        }
        Ok(serde_json::from_str(&event.data)?)
    }
}
