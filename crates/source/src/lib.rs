#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod error;
pub use error::SourceError;

mod traits;
pub use traits::{EventSource, RawEventStream};

mod sse;
pub use sse::{SseDecoder, SseEvent};

mod events;
pub use events::{BLOCK_TOPIC, BlockEvent, EventDecodeError};

mod payload;
pub use payload::{
    ExecutionPayloadV1, ExecutionPayloadV2, ExecutionPayloadV3, ExecutionSummary,
    ExtractExecutionSummary, PayloadError, PayloadVersion, SignedBeaconBlock,
    VersionedExecutionPayload, Withdrawal,
};

mod beacon;
pub use beacon::BeaconClient;

mod quoted;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
