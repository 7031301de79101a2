use reth_db::DatabaseError;
use std::time::Duration;
use thiserror::Error;

/// Errors that may occur while interacting with epoch storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The database environment could not be opened.
    #[error("failed to initialize database: {0}")]
    DatabaseInit(#[from] eyre::Report),

    /// The underlying database returned an error.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// The expected entry was not found in the database.
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// The write would overwrite data that is already stored.
    #[error("conflict error: {0}")]
    ConflictError(String),

    /// An epoch without slots was submitted for writing.
    #[error("epoch {0} has no slots")]
    EmptyEpoch(u64),

    /// A block root is not a 32 byte hex string.
    #[error("block in slot {slot_number} has malformed root {root:?}")]
    InvalidRoot {
        /// The slot of the offending block.
        slot_number: u64,
        /// The rejected root.
        root: String,
    },

    /// The operation was cancelled before it committed.
    #[error("storage operation cancelled")]
    Cancelled,

    /// The operation did not finish within the configured timeout.
    #[error("storage operation timed out after {0:?}")]
    Timeout(Duration),

    /// The blocking task running the operation failed.
    #[error("storage task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
