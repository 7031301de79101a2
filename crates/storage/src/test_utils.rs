//! In-memory [`EpochRepository`] for tests.

use crate::{EpochRepository, StorageError};
use async_trait::async_trait;
use epoch_indexer_types::{Epoch, RETENTION_DEPTH};
use std::{collections::BTreeMap, sync::Mutex};

/// An [`EpochRepository`] keeping epochs in a map.
///
/// Follows the same conflict and retention rules as the MDBX store. Operations can be made to
/// fail through [`InMemoryRepository::failing_with`].
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    epochs: Mutex<BTreeMap<u64, Epoch>>,
    failure: Option<fn() -> StorageError>,
    prune_calls: Mutex<Vec<u64>>,
}

impl InMemoryRepository {
    /// Creates a repository pre-populated with `epochs`.
    pub fn with_epochs(epochs: impl IntoIterator<Item = Epoch>) -> Self {
        let epochs = epochs.into_iter().map(|epoch| (epoch.epoch_number, epoch)).collect();
        Self { epochs: Mutex::new(epochs), ..Default::default() }
    }

    /// Makes every operation fail with the error built by `failure`.
    pub fn failing_with(mut self, failure: fn() -> StorageError) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Returns the stored epoch numbers in ascending order.
    pub fn epoch_numbers(&self) -> Vec<u64> {
        self.lock().keys().copied().collect()
    }

    /// Returns the reference epoch number of every prune call so far.
    pub fn prune_calls(&self) -> Vec<u64> {
        self.prune_calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<u64, Epoch>> {
        self.epochs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self) -> Result<(), StorageError> {
        self.failure.map_or(Ok(()), |failure| Err(failure()))
    }
}

#[async_trait]
impl EpochRepository for InMemoryRepository {
    async fn create(&self, epoch: Epoch) -> Result<(), StorageError> {
        self.check()?;
        if epoch.slots.is_empty() {
            return Err(StorageError::EmptyEpoch(epoch.epoch_number));
        }
        let mut epochs = self.lock();
        if epochs.contains_key(&epoch.epoch_number) {
            return Err(StorageError::ConflictError(format!(
                "epoch {} already stored",
                epoch.epoch_number
            )));
        }
        epochs.insert(epoch.epoch_number, epoch);
        Ok(())
    }

    async fn get(&self) -> Result<Vec<Epoch>, StorageError> {
        self.check()?;
        Ok(self.lock().values().cloned().collect())
    }

    async fn prune(&self, reference: u64) -> Result<usize, StorageError> {
        if let Ok(mut calls) = self.prune_calls.lock() {
            calls.push(reference);
        }
        self.check()?;
        let Some(threshold) = reference.checked_sub(RETENTION_DEPTH) else {
            return Ok(0);
        };
        let mut epochs = self.lock();
        let before = epochs.len();
        epochs.retain(|number, _| *number > threshold);
        Ok(before - epochs.len())
    }
}
