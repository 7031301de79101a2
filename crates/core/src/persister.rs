//! The epoch persistence task.

use crate::{AggregationError, EpochReceiver, Metrics};
use epoch_indexer_storage::EpochRepository;
use epoch_indexer_types::Epoch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Counters describing a finished [`EpochPersister`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistStats {
    /// Epochs stored.
    pub persisted: u64,
    /// Epochs whose write failed.
    pub failed_creates: u64,
    /// Prune calls that failed.
    pub failed_prunes: u64,
    /// Epochs removed by the retention policy.
    pub pruned: u64,
    /// Errors received from the aggregator.
    pub aggregation_errors: u64,
}

/// Stores every epoch received from an aggregator and prunes history behind it.
///
/// Storage failures are logged and counted; the next epoch is processed regardless.
#[derive(Debug)]
pub struct EpochPersister<R> {
    repository: R,
    epochs: EpochReceiver,
    cancel: CancellationToken,
}

impl<R> EpochPersister<R>
where
    R: EpochRepository,
{
    /// Creates a new [`EpochPersister`].
    pub const fn new(repository: R, epochs: EpochReceiver, cancel: CancellationToken) -> Self {
        Self { repository, epochs, cancel }
    }

    /// Consumes epochs until the channel closes or the persister is cancelled.
    pub async fn run(mut self) -> PersistStats {
        info!(target: "persister", "Starting epoch persister");
        let mut stats = PersistStats::default();

        loop {
            let item = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!(target: "persister", "Persister cancellation requested, stopping...");
                    break;
                }
                item = self.epochs.recv() => item,
            };
            match item {
                Some(Ok(epoch)) => self.persist(epoch, &mut stats).await,
                Some(Err(err)) => Self::report(&err, &mut stats),
                None => {
                    info!(target: "persister", "Epoch channel closed, stopping...");
                    break;
                }
            }
        }

        info!(
            target: "persister",
            persisted = stats.persisted,
            failed_creates = stats.failed_creates,
            failed_prunes = stats.failed_prunes,
            pruned = stats.pruned,
            "Epoch persister stopped"
        );
        stats
    }

    /// Creates `epoch`, then prunes relative to its number.
    async fn persist(&self, epoch: Epoch, stats: &mut PersistStats) {
        let epoch_number = epoch.epoch_number;
        let slots = epoch.slots.len();

        match self.repository.create(epoch).await {
            Ok(()) => {
                stats.persisted += 1;
                metrics::counter!(Metrics::EPOCHS_PERSISTED_TOTAL).increment(1);
                metrics::gauge!(Metrics::LATEST_PERSISTED_EPOCH).set(epoch_number as f64);
                info!(target: "persister", epoch_number, slots, "Persisted epoch");
            }
            Err(err) => {
                stats.failed_creates += 1;
                Metrics::record_persistence_failure("create");
                error!(target: "persister", epoch_number, %err, "Failed to persist epoch");
            }
        }

        match self.repository.prune(epoch_number).await {
            Ok(removed) => {
                stats.pruned += removed as u64;
                metrics::counter!(Metrics::EPOCHS_PRUNED_TOTAL).increment(removed as u64);
                if removed > 0 {
                    debug!(target: "persister", epoch_number, removed, "Pruned old epochs");
                }
            }
            Err(err) => {
                stats.failed_prunes += 1;
                Metrics::record_persistence_failure("prune");
                error!(target: "persister", epoch_number, %err, "Failed to prune epochs");
            }
        }
    }

    fn report(err: &AggregationError, stats: &mut PersistStats) {
        stats.aggregation_errors += 1;
        if err.is_terminal() {
            error!(target: "persister", %err, "Aggregator stopped");
        } else {
            warn!(target: "persister", %err, "Aggregator skipped a block event");
        }
    }
}
