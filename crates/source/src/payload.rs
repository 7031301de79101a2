//! Signed block bodies and their fork-specific execution payloads.

use alloy_primitives::{Address, B256, Bytes};
use serde::Deserialize;
use thiserror::Error;

/// The execution fields the indexer keeps from a block body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutionSummary {
    /// The execution block number.
    pub block_number: u64,
    /// The execution gas limit.
    pub gas_limit: u64,
    /// The execution gas used.
    pub gas_used: u64,
    /// Number of transactions in the payload.
    pub transaction_count: u64,
    /// The payload timestamp, in seconds.
    pub timestamp: u64,
}

/// Reads an [`ExecutionSummary`] out of an execution payload.
///
/// Every known payload schema implements this with the same field mapping.
pub trait ExtractExecutionSummary {
    /// Returns the [`ExecutionSummary`] of the payload.
    fn execution_summary(&self) -> ExecutionSummary;
}

/// Errors raised while reading the execution payload of a block body.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The block body uses a schema version without a known execution payload.
    #[error("unsupported execution payload version: {0}")]
    UnsupportedVersion(String),
    /// The block body has a known version but carries no execution payload.
    #[error("block body of version {0:?} has no execution payload")]
    MissingPayload(PayloadVersion),
    /// The execution payload does not match its declared schema.
    #[error("malformed execution payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Known execution payload schema versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadVersion {
    /// The bellatrix execution payload.
    V1,
    /// The capella execution payload, adding withdrawals.
    V2,
    /// The deneb execution payload, adding blob gas accounting. Reused by electra and fulu.
    V3,
}

impl PayloadVersion {
    /// Maps a beacon block `version` (fork name) to its execution payload schema.
    pub fn from_fork(fork: &str) -> Option<Self> {
        match fork.to_ascii_lowercase().as_str() {
            "bellatrix" => Some(Self::V1),
            "capella" => Some(Self::V2),
            "deneb" | "electra" | "fulu" => Some(Self::V3),
            _ => None,
        }
    }
}

/// The bellatrix execution payload, as served by the beacon API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExecutionPayloadV1 {
    /// The execution block hash.
    pub block_hash: B256,
    /// The execution block number.
    #[serde(deserialize_with = "crate::quoted::deserialize")]
    pub block_number: u64,
    /// The execution gas limit.
    #[serde(deserialize_with = "crate::quoted::deserialize")]
    pub gas_limit: u64,
    /// The execution gas used.
    #[serde(deserialize_with = "crate::quoted::deserialize")]
    pub gas_used: u64,
    /// The payload timestamp, in seconds.
    #[serde(deserialize_with = "crate::quoted::deserialize")]
    pub timestamp: u64,
    /// The opaque encoded transactions.
    #[serde(default)]
    pub transactions: Vec<Bytes>,
}

/// A validator withdrawal carried by the capella payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Withdrawal {
    /// Monotonic withdrawal index.
    #[serde(deserialize_with = "crate::quoted::deserialize")]
    pub index: u64,
    /// Index of the withdrawing validator.
    #[serde(deserialize_with = "crate::quoted::deserialize")]
    pub validator_index: u64,
    /// Execution address receiving the withdrawal.
    pub address: Address,
    /// Amount in gwei.
    #[serde(deserialize_with = "crate::quoted::deserialize")]
    pub amount: u64,
}

/// The capella execution payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExecutionPayloadV2 {
    /// The fields shared with [`ExecutionPayloadV1`].
    #[serde(flatten)]
    pub payload_inner: ExecutionPayloadV1,
    /// Withdrawals processed in this block.
    pub withdrawals: Vec<Withdrawal>,
}

/// The deneb execution payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExecutionPayloadV3 {
    /// The fields shared with [`ExecutionPayloadV2`].
    #[serde(flatten)]
    pub payload_inner: ExecutionPayloadV2,
    /// Blob gas consumed by the block.
    #[serde(deserialize_with = "crate::quoted::deserialize")]
    pub blob_gas_used: u64,
    /// Excess blob gas carried into the block.
    #[serde(deserialize_with = "crate::quoted::deserialize")]
    pub excess_blob_gas: u64,
}

impl ExtractExecutionSummary for ExecutionPayloadV1 {
    fn execution_summary(&self) -> ExecutionSummary {
        ExecutionSummary {
            block_number: self.block_number,
            gas_limit: self.gas_limit,
            gas_used: self.gas_used,
            transaction_count: self.transactions.len() as u64,
            timestamp: self.timestamp,
        }
    }
}

impl ExtractExecutionSummary for ExecutionPayloadV2 {
    fn execution_summary(&self) -> ExecutionSummary {
        self.payload_inner.execution_summary()
    }
}

impl ExtractExecutionSummary for ExecutionPayloadV3 {
    fn execution_summary(&self) -> ExecutionSummary {
        self.payload_inner.execution_summary()
    }
}

/// An execution payload of any known version, or a marker for an unknown one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionedExecutionPayload {
    /// A [`ExecutionPayloadV1`].
    V1(ExecutionPayloadV1),
    /// A [`ExecutionPayloadV2`].
    V2(ExecutionPayloadV2),
    /// A [`ExecutionPayloadV3`].
    V3(ExecutionPayloadV3),
    /// A block body version this indexer does not know how to read.
    Unsupported(String),
}

impl VersionedExecutionPayload {
    /// Reads the execution payload of a block body declared as `fork`.
    pub fn from_fork(
        fork: &str,
        payload: Option<&serde_json::Value>,
    ) -> Result<Self, PayloadError> {
        let Some(version) = PayloadVersion::from_fork(fork) else {
            return Ok(Self::Unsupported(fork.to_string()));
        };
        let payload = payload.ok_or(PayloadError::MissingPayload(version))?;

        Ok(match version {
            PayloadVersion::V1 => Self::V1(ExecutionPayloadV1::deserialize(payload)?),
            PayloadVersion::V2 => Self::V2(ExecutionPayloadV2::deserialize(payload)?),
            PayloadVersion::V3 => Self::V3(ExecutionPayloadV3::deserialize(payload)?),
        })
    }

    /// Returns the [`ExecutionSummary`] of the payload.
    ///
    /// Fails with [`PayloadError::UnsupportedVersion`] for [`Self::Unsupported`].
    pub fn summary(&self) -> Result<ExecutionSummary, PayloadError> {
        match self {
            Self::V1(payload) => Ok(payload.execution_summary()),
            Self::V2(payload) => Ok(payload.execution_summary()),
            Self::V3(payload) => Ok(payload.execution_summary()),
            Self::Unsupported(version) => Err(PayloadError::UnsupportedVersion(version.clone())),
        }
    }
}

/// A signed block as returned by `/eth/v2/beacon/blocks/{block_id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SignedBeaconBlock {
    /// The fork name the block body is encoded for.
    pub version: String,
    data: SignedBlockEnvelope,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct SignedBlockEnvelope {
    message: BeaconBlockMessage,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct BeaconBlockMessage {
    #[serde(deserialize_with = "crate::quoted::deserialize")]
    slot: u64,
    state_root: B256,
    body: BeaconBlockBody,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct BeaconBlockBody {
    #[serde(default)]
    execution_payload: Option<serde_json::Value>,
}

impl SignedBeaconBlock {
    /// The slot the block was proposed in.
    pub const fn slot(&self) -> u64 {
        self.data.message.slot
    }

    /// The beacon state root after applying the block.
    pub const fn state_root(&self) -> B256 {
        self.data.message.state_root
    }

    /// Reads the execution payload according to [`Self::version`].
    pub fn execution_payload(&self) -> Result<VersionedExecutionPayload, PayloadError> {
        VersionedExecutionPayload::from_fork(
            &self.version,
            self.data.message.body.execution_payload.as_ref(),
        )
    }
}
