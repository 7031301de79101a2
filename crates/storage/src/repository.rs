//! Async access to epoch storage.

use crate::{EpochStorageReader, EpochStorageWriter, StorageError};
use async_trait::async_trait;
use epoch_indexer_types::Epoch;
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// The epoch store as seen by the persister and the read API.
#[async_trait]
pub trait EpochRepository: Send + Sync {
    /// Atomically stores `epoch` with all of its slots and blocks.
    async fn create(&self, epoch: Epoch) -> Result<(), StorageError>;

    /// Returns every stored epoch, ascending by epoch number.
    async fn get(&self) -> Result<Vec<Epoch>, StorageError>;

    /// Applies the retention policy relative to the `reference` epoch number.
    ///
    /// Returns the number of epochs removed.
    async fn prune(&self, reference: u64) -> Result<usize, StorageError>;
}

#[async_trait]
impl<R: EpochRepository + ?Sized> EpochRepository for Arc<R> {
    async fn create(&self, epoch: Epoch) -> Result<(), StorageError> {
        (**self).create(epoch).await
    }

    async fn get(&self) -> Result<Vec<Epoch>, StorageError> {
        (**self).get().await
    }

    async fn prune(&self, reference: u64) -> Result<usize, StorageError> {
        (**self).prune(reference).await
    }
}

/// An [`EpochRepository`] running blocking storage operations under a timeout.
///
/// Each operation runs on the blocking thread pool with a child of the repository's
/// cancellation token. When the timeout elapses the child token is cancelled and the operation is
/// awaited until it either aborts its transaction or finishes.
///
/// The result reports whether the operation took effect: [`StorageError::Timeout`] means it
/// aborted and nothing was written. An operation that committed before it saw the cancellation
/// returns its own result.
#[derive(Debug)]
pub struct TimedRepository<S> {
    storage: Arc<S>,
    timeout: Duration,
    cancel: CancellationToken,
}

impl<S> TimedRepository<S>
where
    S: EpochStorageReader + EpochStorageWriter + Send + Sync + 'static,
{
    /// Creates a new [`TimedRepository`].
    ///
    /// Cancelling `cancel` aborts every in-flight operation.
    pub fn new(storage: S, timeout: Duration, cancel: CancellationToken) -> Self {
        Self { storage: Arc::new(storage), timeout, cancel }
    }

    async fn run<T, F>(&self, operation: &'static str, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&S, &CancellationToken) -> Result<T, StorageError> + Send + 'static,
    {
        let cancel = self.cancel.child_token();
        let storage = Arc::clone(&self.storage);
        let token = cancel.clone();
        let mut handle = tokio::task::spawn_blocking(move || f(&storage, &token));

        if let Ok(result) = tokio::time::timeout(self.timeout, &mut handle).await {
            return result?;
        }

        cancel.cancel();
        match handle.await? {
            Err(StorageError::Cancelled) if !self.cancel.is_cancelled() => {
                warn!(
                    target: "epoch_storage",
                    operation,
                    timeout = ?self.timeout,
                    "Storage operation timed out"
                );
                Err(StorageError::Timeout(self.timeout))
            }
            Ok(value) => {
                warn!(
                    target: "epoch_storage",
                    operation,
                    timeout = ?self.timeout,
                    "Storage operation completed after its timeout"
                );
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl<S> EpochRepository for TimedRepository<S>
where
    S: EpochStorageReader + EpochStorageWriter + Send + Sync + 'static,
{
    async fn create(&self, epoch: Epoch) -> Result<(), StorageError> {
        self.run("create", move |storage, cancel| storage.create_epoch(&epoch, cancel)).await
    }

    async fn get(&self) -> Result<Vec<Epoch>, StorageError> {
        self.run("get", |storage, cancel| storage.epochs(cancel)).await
    }

    async fn prune(&self, reference: u64) -> Result<usize, StorageError> {
        self.run("prune", move |storage, cancel| storage.prune_epochs(reference, cancel)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EpochDb;
    use epoch_indexer_types::{Block, Slot};
    use std::sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    };
    use tempfile::TempDir;

    fn epoch(number: u64) -> Epoch {
        let root = alloy_primitives::B256::with_last_byte(number as u8).to_string();
        let block = Block {
            slot_number: number * 32,
            block_root: root.clone(),
            state_root: root,
            created_at: 100 * number,
            ..Default::default()
        };
        let slot = Slot::new(number, Duration::from_secs(12), block);
        Epoch::from_slots(number, Duration::from_secs(384), vec![slot])
    }

    /// Storage that blocks for a while and records whether it saw its token cancelled.
    #[derive(Debug, Default)]
    struct SlowStorage {
        observed_cancel: Arc<AtomicBool>,
        writes: Mutex<Vec<u64>>,
        /// Finishes the operation without checking the token, as a commit already underway does.
        ignore_cancel: bool,
    }

    impl SlowStorage {
        fn wait(&self, cancel: &CancellationToken) -> Result<(), StorageError> {
            if self.ignore_cancel {
                std::thread::sleep(Duration::from_millis(100));
                return Ok(());
            }
            for _ in 0..200 {
                if cancel.is_cancelled() {
                    self.observed_cancel.store(true, Ordering::SeqCst);
                    return Err(StorageError::Cancelled);
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            Ok(())
        }
    }

    impl EpochStorageReader for SlowStorage {
        fn epochs(&self, cancel: &CancellationToken) -> Result<Vec<Epoch>, StorageError> {
            self.wait(cancel)?;
            Ok(Vec::new())
        }
    }

    impl EpochStorageWriter for SlowStorage {
        fn create_epoch(
            &self,
            epoch: &Epoch,
            cancel: &CancellationToken,
        ) -> Result<(), StorageError> {
            self.wait(cancel)?;
            self.writes.lock().unwrap().push(epoch.epoch_number);
            Ok(())
        }

        fn prune_epochs(&self, _: u64, cancel: &CancellationToken) -> Result<usize, StorageError> {
            self.wait(cancel)?;
            Ok(0)
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_timed_repository_over_epoch_db() {
        let dir = TempDir::new().unwrap();
        let db = EpochDb::new(dir.path()).unwrap();
        let repo = TimedRepository::new(db, Duration::from_secs(5), CancellationToken::new());

        for number in 0..7 {
            repo.create(epoch(number)).await.unwrap();
        }
        assert_eq!(repo.prune(6).await.unwrap(), 2);

        let numbers: Vec<u64> =
            repo.get().await.unwrap().iter().map(|epoch| epoch.epoch_number).collect();
        assert_eq!(numbers, vec![2, 3, 4, 5, 6]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_timeout_cancels_operation() {
        let storage = SlowStorage::default();
        let observed = Arc::clone(&storage.observed_cancel);
        let repo =
            TimedRepository::new(storage, Duration::from_millis(20), CancellationToken::new());

        let result = repo.create(epoch(1)).await;
        assert!(matches!(result, Err(StorageError::Timeout(_))));

        assert!(observed.load(Ordering::SeqCst));
        assert!(repo.storage.writes.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_commit_after_deadline_reports_success() {
        let storage = SlowStorage { ignore_cancel: true, ..Default::default() };
        let repo =
            TimedRepository::new(storage, Duration::from_millis(20), CancellationToken::new());

        repo.create(epoch(3)).await.unwrap();

        assert_eq!(*repo.storage.writes.lock().unwrap(), vec![3]);
        assert!(!repo.storage.observed_cancel.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_parent_cancellation_aborts_operation() {
        let cancel = CancellationToken::new();
        let repo =
            TimedRepository::new(SlowStorage::default(), Duration::from_secs(5), cancel.clone());
        cancel.cancel();

        assert!(matches!(repo.get().await, Err(StorageError::Cancelled)));
    }
}
