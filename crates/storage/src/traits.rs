use crate::StorageError;
use epoch_indexer_types::Epoch;
use tokio_util::sync::CancellationToken;

/// Read access to stored epochs.
///
/// Implementations abort and return [`StorageError::Cancelled`] once `cancel` fires.
pub trait EpochStorageReader {
    /// Returns every stored [`Epoch`] with its slots and blocks.
    ///
    /// Epochs are ordered by ascending epoch number and their slots by ascending slot number.
    fn epochs(&self, cancel: &CancellationToken) -> Result<Vec<Epoch>, StorageError>;
}

/// Write access to stored epochs.
///
/// Every call runs in a single transaction that is only committed on success.
pub trait EpochStorageWriter {
    /// Stores `epoch` together with all of its slots and blocks.
    ///
    /// # Returns
    /// * `Ok(())` once every row is committed.
    /// * `Err(StorageError::EmptyEpoch)` if `epoch` has no slots.
    /// * `Err(StorageError::ConflictError)` if the epoch or one of its slots is already stored.
    fn create_epoch(&self, epoch: &Epoch, cancel: &CancellationToken) -> Result<(), StorageError>;

    /// Deletes every epoch numbered at or below `reference - RETENTION_DEPTH`, with its slots
    /// and blocks.
    ///
    /// Deletes nothing when `reference` is below the retention depth.
    ///
    /// # Returns
    /// The number of epochs removed.
    fn prune_epochs(&self, reference: u64, cancel: &CancellationToken)
    -> Result<usize, StorageError>;
}
