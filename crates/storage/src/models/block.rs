//! The `blocks` table.
//!
//! Every slot owns exactly one block, so blocks share the slot number as key. The execution
//! block number is kept as a column.

use crate::StorageError;
use alloy_primitives::B256;
use epoch_indexer_types::Block;
use reth_codecs::Compact;
use reth_db_api::table::Table;
use serde::{Deserialize, Serialize};

/// A stored block, keyed by slot number in [`Blocks`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Compact)]
pub(crate) struct BlockRow {
    /// The execution block number.
    pub(crate) block_number: u64,
    /// The beacon block root.
    pub(crate) block_root: B256,
    /// The beacon state root.
    pub(crate) state_root: B256,
    /// The execution gas limit.
    pub(crate) gas_limit: u64,
    /// The execution gas used.
    pub(crate) gas_used: u64,
    /// Number of execution transactions.
    pub(crate) no_of_transactions: u64,
    /// The execution payload timestamp.
    pub(crate) created_at: u64,
    /// Whether the execution fields could not be read.
    pub(crate) degraded: bool,
}

impl BlockRow {
    /// Rebuilds the [`Block`] stored under `slot_number`.
    pub(crate) fn into_block(self, slot_number: u64) -> Block {
        Block {
            block_number: self.block_number,
            block_root: self.block_root.to_string(),
            state_root: self.state_root.to_string(),
            slot_number,
            gas_limit: self.gas_limit,
            gas_used: self.gas_used,
            no_of_transactions: self.no_of_transactions,
            created_at: self.created_at,
            degraded: self.degraded,
        }
    }
}

impl TryFrom<&Block> for BlockRow {
    type Error = StorageError;

    fn try_from(block: &Block) -> Result<Self, Self::Error> {
        let parse_root = |root: &str| {
            root.parse::<B256>().map_err(|_| StorageError::InvalidRoot {
                slot_number: block.slot_number,
                root: root.to_string(),
            })
        };
        Ok(Self {
            block_number: block.block_number,
            block_root: parse_root(&block.block_root)?,
            state_root: parse_root(&block.state_root)?,
            gas_limit: block.gas_limit,
            gas_used: block.gas_used,
            no_of_transactions: block.no_of_transactions,
            created_at: block.created_at,
            degraded: block.degraded,
        })
    }
}

/// Blocks by slot number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub(crate) struct Blocks;

impl Table for Blocks {
    const NAME: &'static str = "blocks";
    const DUPSORT: bool = false;
    type Key = u64;
    type Value = BlockRow;
}
