//! Provider for epoch, slot and block rows.

use crate::{
    StorageError,
    models::{BlockRow, Blocks, EpochRow, Epochs, SlotRow, Slots},
};
use epoch_indexer_types::{Block, Epoch};
use reth_db_api::{
    cursor::DbCursorRO,
    transaction::{DbTx, DbTxMut},
};
use std::collections::{BTreeMap, HashMap};
use tracing::{error, warn};

/// Provides access to epoch storage operations within a transaction.
#[derive(Debug)]
pub(crate) struct EpochProvider<'tx, TX> {
    tx: &'tx TX,
}

impl<'tx, TX> EpochProvider<'tx, TX> {
    /// Creates a new [`EpochProvider`] instance.
    pub(crate) const fn new(tx: &'tx TX) -> Self {
        Self { tx }
    }
}

impl<TX> EpochProvider<'_, TX>
where
    TX: DbTx,
{
    /// Reads every row of the three tables and joins them into [`Epoch`]s.
    pub(crate) fn epochs(&self) -> Result<Vec<Epoch>, StorageError> {
        let epoch_rows = self.read_all::<Epochs>()?;
        let slot_rows = self.read_all::<Slots>()?;
        let mut blocks: HashMap<u64, BlockRow> = self.read_all::<Blocks>()?.into_iter().collect();

        let mut slots_by_epoch: BTreeMap<u64, Vec<_>> = BTreeMap::new();
        for (slot_number, row) in slot_rows {
            let block = match blocks.remove(&slot_number) {
                Some(block) => block.into_block(slot_number),
                None => {
                    warn!(target: "epoch_storage", slot_number, "Slot has no stored block");
                    Block { slot_number, ..Default::default() }
                }
            };
            slots_by_epoch
                .entry(row.epoch_number)
                .or_default()
                .push(row.into_slot(slot_number, block));
        }

        Ok(epoch_rows
            .into_iter()
            .map(|(epoch_number, row)| Epoch {
                epoch_number,
                start_time: row.start_time,
                end_time: row.end_time,
                slots: slots_by_epoch.remove(&epoch_number).unwrap_or_default(),
            })
            .collect())
    }

    /// Fails with [`StorageError::ConflictError`] if `epoch` or any of its slots is stored.
    fn ensure_vacant(&self, epoch: &Epoch) -> Result<(), StorageError> {
        let epoch_number = epoch.epoch_number;
        if self.tx.get::<Epochs>(epoch_number)?.is_some() {
            warn!(target: "epoch_storage", epoch_number, "Epoch already stored");
            return Err(StorageError::ConflictError(format!("epoch {epoch_number} already stored")));
        }
        for slot in &epoch.slots {
            if self.tx.get::<Slots>(slot.slot_number)?.is_some() {
                warn!(
                    target: "epoch_storage",
                    epoch_number,
                    slot_number = slot.slot_number,
                    "Slot already stored"
                );
                return Err(StorageError::ConflictError(format!(
                    "slot {} already stored",
                    slot.slot_number
                )));
            }
        }
        Ok(())
    }

    /// Collects every `(key, value)` pair of table `T` in key order.
    fn read_all<T>(&self) -> Result<Vec<(u64, T::Value)>, StorageError>
    where
        T: reth_db_api::table::Table<Key = u64>,
    {
        let mut cursor = self.tx.cursor_read::<T>().inspect_err(|err| {
            error!(target: "epoch_storage", table = T::NAME, ?err, "Failed to open cursor");
        })?;
        let walker = cursor.walk(None)?;
        let mut rows = Vec::new();
        for row in walker {
            rows.push(row.inspect_err(|err| {
                error!(target: "epoch_storage", table = T::NAME, ?err, "Failed to read row");
            })?);
        }
        Ok(rows)
    }
}

impl<TX> EpochProvider<'_, TX>
where
    TX: DbTxMut + DbTx,
{
    /// Writes the epoch row, then every slot row, then every block row.
    pub(crate) fn insert_epoch(&self, epoch: &Epoch) -> Result<(), StorageError> {
        let epoch_number = epoch.epoch_number;
        if epoch.slots.is_empty() {
            warn!(target: "epoch_storage", epoch_number, "Refusing to store empty epoch");
            return Err(StorageError::EmptyEpoch(epoch_number));
        }
        self.ensure_vacant(epoch)?;

        let blocks = epoch
            .slots
            .iter()
            .map(|slot| BlockRow::try_from(&slot.block))
            .collect::<Result<Vec<_>, _>>()?;

        self.tx.put::<Epochs>(epoch_number, EpochRow::from(epoch)).inspect_err(|err| {
            error!(target: "epoch_storage", epoch_number, ?err, "Failed to store epoch");
        })?;
        for slot in &epoch.slots {
            self.tx.put::<Slots>(slot.slot_number, SlotRow::from(slot)).inspect_err(|err| {
                error!(
                    target: "epoch_storage",
                    epoch_number,
                    slot_number = slot.slot_number,
                    ?err,
                    "Failed to store slot"
                );
            })?;
        }
        for (slot, block) in epoch.slots.iter().zip(blocks) {
            self.tx.put::<Blocks>(slot.slot_number, block).inspect_err(|err| {
                error!(
                    target: "epoch_storage",
                    epoch_number,
                    slot_number = slot.slot_number,
                    ?err,
                    "Failed to store block"
                );
            })?;
        }
        Ok(())
    }

    /// Deletes every epoch numbered at or below `threshold` with its slots and blocks.
    ///
    /// Returns the number of epochs removed.
    pub(crate) fn remove_epochs_through(&self, threshold: u64) -> Result<usize, StorageError> {
        let epoch_numbers: Vec<u64> = {
            let mut cursor = self.tx.cursor_read::<Epochs>()?;
            let walker = cursor.walk_range(..=threshold)?;
            walker.map(|row| row.map(|(number, _)| number)).collect::<Result<_, _>>()?
        };
        let slot_numbers: Vec<u64> = self
            .read_all::<Slots>()?
            .into_iter()
            .filter(|(_, row)| row.epoch_number <= threshold)
            .map(|(slot_number, _)| slot_number)
            .collect();

        for slot_number in &slot_numbers {
            self.tx.delete::<Blocks>(*slot_number, None)?;
            self.tx.delete::<Slots>(*slot_number, None)?;
        }
        for epoch_number in &epoch_numbers {
            self.tx.delete::<Epochs>(*epoch_number, None).inspect_err(|err| {
                error!(target: "epoch_storage", epoch_number, ?err, "Failed to delete epoch");
            })?;
        }
        Ok(epoch_numbers.len())
    }
}
