//! Main database access structure.

use crate::{
    StorageError,
    models::Tables,
    providers::EpochProvider,
    traits::{EpochStorageReader, EpochStorageWriter},
};
use epoch_indexer_types::{Epoch, RETENTION_DEPTH};
use reth_db::{
    DatabaseEnv,
    mdbx::{DatabaseArguments, init_db_for},
};
use reth_db_api::{Database, transaction::DbTx};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Fails with [`StorageError::Cancelled`] once `cancel` has fired.
fn ensure_active(cancel: &CancellationToken) -> Result<(), StorageError> {
    if cancel.is_cancelled() {
        return Err(StorageError::Cancelled);
    }
    Ok(())
}

/// Manages the MDBX environment holding every stored epoch.
///
/// Each operation opens its own transaction. Write transactions are dropped, and therefore
/// aborted, on any error and are only committed once every row is written.
#[derive(Debug)]
pub struct EpochDb {
    env: DatabaseEnv,
}

impl EpochDb {
    /// Creates or opens a database environment at the given path.
    pub fn new(path: &Path) -> Result<Self, StorageError> {
        let env = init_db_for::<_, Tables>(path, DatabaseArguments::default())?;
        info!(target: "epoch_storage", path = %path.display(), "Opened epoch database");
        Ok(Self { env })
    }
}

impl EpochStorageReader for EpochDb {
    fn epochs(&self, cancel: &CancellationToken) -> Result<Vec<Epoch>, StorageError> {
        ensure_active(cancel)?;
        let tx = self.env.tx()?;
        let epochs = EpochProvider::new(&tx).epochs()?;
        ensure_active(cancel)?;
        tx.commit()?;
        Ok(epochs)
    }
}

impl EpochStorageWriter for EpochDb {
    fn create_epoch(&self, epoch: &Epoch, cancel: &CancellationToken) -> Result<(), StorageError> {
        ensure_active(cancel)?;
        let tx = self.env.tx_mut()?;
        EpochProvider::new(&tx).insert_epoch(epoch)?;
        ensure_active(cancel)?;
        tx.commit()?;

        debug!(
            target: "epoch_storage",
            epoch_number = epoch.epoch_number,
            slots = epoch.slots.len(),
            "Stored epoch"
        );
        Ok(())
    }

    fn prune_epochs(
        &self,
        reference: u64,
        cancel: &CancellationToken,
    ) -> Result<usize, StorageError> {
        let Some(threshold) = reference.checked_sub(RETENTION_DEPTH) else {
            debug!(target: "epoch_storage", reference, "Nothing to prune");
            return Ok(0);
        };

        ensure_active(cancel)?;
        let tx = self.env.tx_mut()?;
        let removed = EpochProvider::new(&tx).remove_epochs_through(threshold)?;
        ensure_active(cancel)?;
        tx.commit()?;

        if removed > 0 {
            debug!(target: "epoch_storage", reference, threshold, removed, "Pruned epochs");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use epoch_indexer_types::{Block, Slot};
    use rstest::rstest;
    use std::{sync::Arc, time::Duration};
    use tempfile::TempDir;

    fn setup_db() -> (TempDir, EpochDb) {
        let tmp_dir = TempDir::new().expect("create temp dir");
        let db = EpochDb::new(&tmp_dir.path().join("epochdb")).expect("open epoch db");
        (tmp_dir, db)
    }

    fn epoch(number: u64, slots: u64) -> Epoch {
        let slots = (number * 32..number * 32 + slots)
            .map(|slot_number| {
                let block = Block {
                    block_number: 10_000 + slot_number,
                    block_root: B256::left_padding_from(&slot_number.to_be_bytes()).to_string(),
                    state_root: B256::right_padding_from(&slot_number.to_be_bytes()).to_string(),
                    slot_number,
                    gas_limit: 30_000_000,
                    gas_used: 1_000 * slot_number,
                    no_of_transactions: slot_number % 7,
                    created_at: 1_700_000_000 + 12 * slot_number,
                    degraded: false,
                };
                Slot::new(number, Duration::from_secs(12), block)
            })
            .collect();
        Epoch::from_slots(number, Duration::from_secs(384), slots)
    }

    fn stored_numbers(db: &EpochDb) -> Vec<u64> {
        db.epochs(&CancellationToken::new())
            .unwrap()
            .iter()
            .map(|epoch| epoch.epoch_number)
            .collect()
    }

    #[test]
    fn test_create_and_open_db() {
        let (_dir, db) = setup_db();
        assert!(db.epochs(&CancellationToken::new()).unwrap().is_empty());
    }

    #[test]
    fn test_create_then_get_round_trips() {
        let (_dir, db) = setup_db();
        let cancel = CancellationToken::new();
        let first = epoch(7, 32);
        let second = epoch(8, 3);

        db.create_epoch(&second, &cancel).unwrap();
        db.create_epoch(&first, &cancel).unwrap();

        assert_eq!(db.epochs(&cancel).unwrap(), vec![first, second]);
    }

    #[test]
    fn test_degraded_block_round_trips() {
        let (_dir, db) = setup_db();
        let cancel = CancellationToken::new();
        let block = Block::degraded(
            64,
            B256::with_last_byte(1).to_string(),
            B256::with_last_byte(2).to_string(),
        );
        let slots = vec![Slot::new(2, Duration::from_secs(12), block)];
        let stored = Epoch::from_slots(2, Duration::from_secs(384), slots);

        db.create_epoch(&stored, &cancel).unwrap();
        assert_eq!(db.epochs(&cancel).unwrap(), vec![stored]);
    }

    #[test]
    fn test_duplicate_epoch_is_rejected() {
        let (_dir, db) = setup_db();
        let cancel = CancellationToken::new();
        db.create_epoch(&epoch(4, 2), &cancel).unwrap();

        let result = db.create_epoch(&epoch(4, 5), &cancel);
        assert!(matches!(result, Err(StorageError::ConflictError(_))));
        assert_eq!(db.epochs(&cancel).unwrap()[0].slots.len(), 2);
    }

    #[test]
    fn test_conflicting_slot_leaves_no_partial_epoch() {
        let (_dir, db) = setup_db();
        let cancel = CancellationToken::new();
        db.create_epoch(&epoch(4, 2), &cancel).unwrap();

        let mut clashing = epoch(5, 2);
        clashing.slots.push(epoch(4, 1).slots.remove(0));
        let result = db.create_epoch(&clashing, &cancel);

        assert!(matches!(result, Err(StorageError::ConflictError(_))));
        assert_eq!(stored_numbers(&db), vec![4]);
    }

    #[test]
    fn test_invalid_root_aborts_whole_epoch() {
        let (_dir, db) = setup_db();
        let cancel = CancellationToken::new();
        let mut broken = epoch(6, 3);
        broken.slots[2].block.state_root = "not a root".to_string();

        let result = db.create_epoch(&broken, &cancel);
        assert!(matches!(result, Err(StorageError::InvalidRoot { .. })));
        assert!(stored_numbers(&db).is_empty());
    }

    #[test]
    fn test_empty_epoch_is_rejected() {
        let (_dir, db) = setup_db();
        let empty = Epoch { epoch_number: 3, ..Default::default() };

        let result = db.create_epoch(&empty, &CancellationToken::new());
        assert!(matches!(result, Err(StorageError::EmptyEpoch(3))));
        assert!(stored_numbers(&db).is_empty());
    }

    #[test]
    fn test_prune_keeps_retention_window() {
        let (_dir, db) = setup_db();
        let cancel = CancellationToken::new();
        for number in 0..=10 {
            db.create_epoch(&epoch(number, 2), &cancel).unwrap();
        }

        assert_eq!(db.prune_epochs(10, &cancel).unwrap(), 6);
        assert_eq!(stored_numbers(&db), vec![6, 7, 8, 9, 10]);
        let slots: Vec<u64> = db
            .epochs(&cancel)
            .unwrap()
            .iter()
            .flat_map(|epoch| epoch.slots.iter().map(|slot| slot.epoch_number))
            .collect();
        assert!(slots.iter().all(|epoch_number| *epoch_number > 5));
    }

    #[test]
    fn test_prune_single_epoch_scenario() {
        let (_dir, db) = setup_db();
        let cancel = CancellationToken::new();
        db.create_epoch(&epoch(10, 4), &cancel).unwrap();

        assert_eq!(db.prune_epochs(10, &cancel).unwrap(), 0);
        assert_eq!(stored_numbers(&db), vec![10]);
    }

    #[rstest]
    #[case::empty_history(0, 0, 0..=7)]
    #[case::below_retention_depth(4, 0, 0..=7)]
    #[case::first_threshold(5, 1, 1..=7)]
    #[case::inside_history(7, 3, 3..=7)]
    #[case::far_ahead(20, 8, 1..=0)]
    #[case::max_reference(u64::MAX, 8, 1..=0)]
    fn test_prune_threshold(
        #[case] reference: u64,
        #[case] removed: usize,
        #[case] remaining: std::ops::RangeInclusive<u64>,
    ) {
        let (_dir, db) = setup_db();
        let cancel = CancellationToken::new();
        for number in 0..=7 {
            db.create_epoch(&epoch(number, 1), &cancel).unwrap();
        }

        assert_eq!(db.prune_epochs(reference, &cancel).unwrap(), removed);
        assert_eq!(stored_numbers(&db), remaining.collect::<Vec<_>>());
    }

    #[test]
    fn test_pruned_slots_can_be_written_again() {
        let (_dir, db) = setup_db();
        let cancel = CancellationToken::new();
        db.create_epoch(&epoch(0, 2), &cancel).unwrap();
        db.prune_epochs(RETENTION_DEPTH, &cancel).unwrap();

        db.create_epoch(&epoch(0, 2), &cancel).unwrap();
        assert_eq!(stored_numbers(&db), vec![0]);
    }

    #[test]
    fn test_cancelled_operations_write_nothing() {
        let (_dir, db) = setup_db();
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(matches!(db.create_epoch(&epoch(1, 1), &cancel), Err(StorageError::Cancelled)));
        assert!(matches!(db.prune_epochs(9, &cancel), Err(StorageError::Cancelled)));
        assert!(matches!(db.epochs(&cancel), Err(StorageError::Cancelled)));
        assert!(stored_numbers(&db).is_empty());
    }

    #[test]
    fn test_concurrent_creates() {
        let (_dir, db) = setup_db();
        let db = Arc::new(db);

        let distinct: Vec<_> = [1, 2]
            .into_iter()
            .map(|number| {
                let db = Arc::clone(&db);
                std::thread::spawn(move || {
                    db.create_epoch(&epoch(number, 4), &CancellationToken::new())
                })
            })
            .collect();
        for handle in distinct {
            handle.join().unwrap().unwrap();
        }
        assert_eq!(stored_numbers(&db), vec![1, 2]);

        let same: Vec<_> = (0..4)
            .map(|_| {
                let db = Arc::clone(&db);
                std::thread::spawn(move || {
                    db.create_epoch(&epoch(3, 4), &CancellationToken::new())
                })
            })
            .collect();
        let successes =
            same.into_iter().map(|handle| handle.join().unwrap()).filter(Result::is_ok).count();
        assert_eq!(successes, 1);
        assert_eq!(db.epochs(&CancellationToken::new()).unwrap()[2].slots.len(), 4);
    }
}
