//! The epoch aggregation task.

use crate::{
    AggregationError, AggregatorState, ChainTiming, Metrics, Transition, block_from_signed,
};
use epoch_indexer_source::{BlockEvent, EventSource, SseEvent};
use epoch_indexer_types::{Block, Epoch};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Items produced by an [`EpochAggregator`] subscription.
pub type EpochReceiver = mpsc::Receiver<Result<Epoch, AggregationError>>;

/// Turns the block notifications of an [`EventSource`] into completed [`Epoch`]s.
///
/// The output channel holds a single item, so a slow consumer holds back event processing.
#[derive(Debug)]
pub struct EpochAggregator<S> {
    source: Arc<S>,
    cancel: CancellationToken,
}

impl<S> EpochAggregator<S>
where
    S: EventSource + 'static,
{
    /// Creates a new [`EpochAggregator`] reading from `source`.
    ///
    /// Cancelling `cancel` ends the subscription and closes its channel.
    pub const fn new(source: Arc<S>, cancel: CancellationToken) -> Self {
        Self { source, cancel }
    }

    /// Starts the aggregation task and returns its output channel.
    ///
    /// The channel closes after a terminal error or once the aggregator is cancelled. The epoch
    /// that is still open at that point is never emitted.
    pub fn subscribe(self) -> EpochReceiver {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!(target: "aggregator", "Aggregator cancellation requested, stopping...");
                }
                _ = self.aggregate(&tx) => {}
            }
        });
        rx
    }

    async fn aggregate(&self, tx: &mpsc::Sender<Result<Epoch, AggregationError>>) {
        let timing = match ChainTiming::resolve(self.source.as_ref()).await {
            Ok(timing) => timing,
            Err(err) => {
                error!(target: "aggregator", %err, "Failed to resolve chain timing");
                Metrics::record_aggregation_error(&err);
                let _ = tx.send(Err(err)).await;
                return;
            }
        };
        info!(
            target: "aggregator",
            slots_per_epoch = timing.slots_per_epoch(),
            slot_duration = ?timing.slot_duration(),
            "Resolved chain timing"
        );

        let mut events = match self.source.subscribe_blocks().await {
            Ok(events) => events,
            Err(err) => {
                let err = AggregationError::Subscription(err);
                error!(target: "aggregator", %err, "Failed to subscribe to block events");
                Metrics::record_aggregation_error(&err);
                let _ = tx.send(Err(err)).await;
                return;
            }
        };

        let mut state = AggregatorState::default();
        loop {
            let observed = match events.next().await {
                Some(Ok(frame)) => self.observe(&frame).await,
                Some(Err(err)) => Err(AggregationError::Subscription(err)),
                None => Err(AggregationError::StreamClosed),
            };

            let Transition { state: next, epoch, error } = state.transition(&timing, observed);
            state = next;

            if let Some(err) = error {
                Metrics::record_aggregation_error(&err);
                let terminal = err.is_terminal();
                if terminal {
                    warn!(
                        target: "aggregator",
                        %err,
                        buffered_slots = state.slots().len(),
                        "Block event stream ended, dropping open epoch"
                    );
                } else {
                    warn!(target: "aggregator", %err, "Skipping block event");
                }
                if tx.send(Err(err)).await.is_err() || terminal {
                    return;
                }
            }

            if let Some(epoch) = epoch {
                info!(
                    target: "aggregator",
                    epoch_number = epoch.epoch_number,
                    slots = epoch.slots.len(),
                    "Epoch completed"
                );
                metrics::counter!(Metrics::EPOCHS_EMITTED_TOTAL).increment(1);
                if tx.send(Ok(epoch)).await.is_err() {
                    debug!(target: "aggregator", "Epoch receiver dropped, stopping");
                    return;
                }
            }
        }
    }

    /// Decodes a notification and fetches the block it announces.
    async fn observe(&self, frame: &SseEvent) -> Result<Block, AggregationError> {
        let event = BlockEvent::try_from(frame)?;
        let slot = event.slot;

        let signed = self
            .source
            .signed_block(&event.block.to_string())
            .await
            .map_err(|source| AggregationError::Lookup { slot, source })?
            .ok_or(AggregationError::BlockNotFound { slot, block_root: event.block })?;

        let block = block_from_signed(&event, &signed)?;
        if block.degraded {
            metrics::counter!(Metrics::DEGRADED_BLOCKS_TOTAL).increment(1);
        }
        debug!(target: "aggregator", slot, block_number = block.block_number, "Observed block");
        Ok(block)
    }
}
