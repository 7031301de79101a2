//! Metrics recorded by the indexing pipeline.

use crate::AggregationError;

/// Container for the pipeline's metric names.
#[derive(Debug, Clone)]
pub struct Metrics;

impl Metrics {
    /// Epochs emitted by the aggregator.
    pub const EPOCHS_EMITTED_TOTAL: &'static str = "epoch_indexer_epochs_emitted_total";
    /// Errors reported by the aggregator, labeled by kind.
    pub const AGGREGATION_ERRORS_TOTAL: &'static str = "epoch_indexer_aggregation_errors_total";
    /// Blocks stored without execution fields.
    pub const DEGRADED_BLOCKS_TOTAL: &'static str = "epoch_indexer_degraded_blocks_total";
    /// Epochs written to storage.
    pub const EPOCHS_PERSISTED_TOTAL: &'static str = "epoch_indexer_epochs_persisted_total";
    /// Failed storage operations, labeled by operation.
    pub const PERSISTENCE_FAILURES_TOTAL: &'static str = "epoch_indexer_persistence_failures_total";
    /// Epochs removed by the retention policy.
    pub const EPOCHS_PRUNED_TOTAL: &'static str = "epoch_indexer_epochs_pruned_total";
    /// Number of the most recently stored epoch.
    pub const LATEST_PERSISTED_EPOCH: &'static str = "epoch_indexer_latest_persisted_epoch";

    /// Describes and zeroes every metric.
    pub fn init() {
        Self::describe();
        Self::zero();
    }

    fn describe() {
        metrics::describe_counter!(
            Self::EPOCHS_EMITTED_TOTAL,
            metrics::Unit::Count,
            "Total number of epochs closed by the aggregator",
        );
        metrics::describe_counter!(
            Self::AGGREGATION_ERRORS_TOTAL,
            metrics::Unit::Count,
            "Total number of errors reported by the aggregator",
        );
        metrics::describe_counter!(
            Self::DEGRADED_BLOCKS_TOTAL,
            metrics::Unit::Count,
            "Total number of blocks with an unsupported execution payload version",
        );
        metrics::describe_counter!(
            Self::EPOCHS_PERSISTED_TOTAL,
            metrics::Unit::Count,
            "Total number of epochs written to storage",
        );
        metrics::describe_counter!(
            Self::PERSISTENCE_FAILURES_TOTAL,
            metrics::Unit::Count,
            "Total number of failed storage operations",
        );
        metrics::describe_counter!(
            Self::EPOCHS_PRUNED_TOTAL,
            metrics::Unit::Count,
            "Total number of epochs removed by the retention policy",
        );
        metrics::describe_gauge!(
            Self::LATEST_PERSISTED_EPOCH,
            metrics::Unit::Count,
            "Number of the most recently stored epoch",
        );
    }

    fn zero() {
        metrics::counter!(Self::EPOCHS_EMITTED_TOTAL).increment(0);
        metrics::counter!(Self::DEGRADED_BLOCKS_TOTAL).increment(0);
        metrics::counter!(Self::EPOCHS_PERSISTED_TOTAL).increment(0);
        metrics::counter!(Self::EPOCHS_PRUNED_TOTAL).increment(0);
        metrics::gauge!(Self::LATEST_PERSISTED_EPOCH).set(0.0);
    }

    pub(crate) fn record_aggregation_error(error: &AggregationError) {
        metrics::counter!(Self::AGGREGATION_ERRORS_TOTAL, "kind" => error.kind()).increment(1);
    }

    pub(crate) fn record_persistence_failure(operation: &'static str) {
        metrics::counter!(Self::PERSISTENCE_FAILURES_TOTAL, "operation" => operation).increment(1);
    }
}
