//! Contains the [`Block`] type.

use serde::{Deserialize, Serialize};

/// A block observed on the beacon chain together with its execution payload summary.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// The execution block number.
    pub block_number: u64,
    /// The beacon block root, `0x`-prefixed hex.
    pub block_root: String,
    /// The beacon state root, `0x`-prefixed hex.
    pub state_root: String,
    /// The slot this block was proposed in.
    pub slot_number: u64,
    /// The execution gas limit.
    pub gas_limit: u64,
    /// The execution gas used.
    pub gas_used: u64,
    /// Number of transactions in the execution payload.
    pub no_of_transactions: u64,
    /// The execution payload timestamp, in Unix seconds.
    ///
    /// Rendered as an RFC 3339 string under `created_at`.
    #[serde(rename = "created_at", with = "crate::rfc3339")]
    pub created_at: u64,
    /// Set when the block body used an execution payload version this indexer cannot read.
    ///
    /// A degraded block keeps its roots and slot number but every execution field is zero.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl Block {
    /// Builds a degraded [`Block`] for a block body whose execution payload could not be read.
    pub fn degraded(slot_number: u64, block_root: String, state_root: String) -> Self {
        Self { slot_number, block_root, state_root, degraded: true, ..Default::default() }
    }
}
