//! Chain timing parameters.

use crate::AggregationError;
use epoch_indexer_source::{EventSource, SourceError};
use std::{num::NonZeroU64, time::Duration};

/// The chain constants that define epoch boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainTiming {
    slots_per_epoch: NonZeroU64,
    slot_duration: Duration,
}

impl ChainTiming {
    /// Creates a new [`ChainTiming`].
    pub const fn new(slots_per_epoch: NonZeroU64, slot_duration: Duration) -> Self {
        Self { slots_per_epoch, slot_duration }
    }

    /// Resolves the chain timing from `source`.
    pub async fn resolve<S: EventSource + ?Sized>(source: &S) -> Result<Self, AggregationError> {
        let slots_per_epoch = source.slots_per_epoch().await.map_err(AggregationError::ChainSpec)?;
        let slots_per_epoch = NonZeroU64::new(slots_per_epoch).ok_or(AggregationError::ChainSpec(
            SourceError::MissingSpecValue("SLOTS_PER_EPOCH"),
        ))?;
        let slot_duration = source.slot_duration().await.map_err(AggregationError::ChainSpec)?;
        Ok(Self::new(slots_per_epoch, slot_duration))
    }

    /// The number of slots in an epoch.
    pub const fn slots_per_epoch(&self) -> u64 {
        self.slots_per_epoch.get()
    }

    /// The duration of a slot.
    pub const fn slot_duration(&self) -> Duration {
        self.slot_duration
    }

    /// The duration of an epoch.
    pub fn epoch_duration(&self) -> Duration {
        u32::try_from(self.slots_per_epoch.get())
            .ok()
            .and_then(|slots| self.slot_duration.checked_mul(slots))
            .unwrap_or(Duration::MAX)
    }

    /// The epoch `slot` belongs to.
    pub const fn epoch_of(&self, slot: u64) -> u64 {
        slot / self.slots_per_epoch.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epoch_indexer_source::test_utils::MockEventSource;

    #[test]
    fn test_epoch_arithmetic() {
        let timing = ChainTiming::new(NonZeroU64::new(32).unwrap(), Duration::from_secs(12));
        assert_eq!(timing.epoch_duration(), Duration::from_secs(384));
        assert_eq!(timing.epoch_of(0), 0);
        assert_eq!(timing.epoch_of(31), 0);
        assert_eq!(timing.epoch_of(32), 1);
        assert_eq!(timing.epoch_of(6_000_001), 187_500);
    }

    #[tokio::test]
    async fn test_resolve_from_source() {
        let source = MockEventSource::new(8, Duration::from_secs(6));
        let timing = ChainTiming::resolve(&source).await.unwrap();
        assert_eq!(timing.slots_per_epoch(), 8);
        assert_eq!(timing.slot_duration(), Duration::from_secs(6));
    }

    #[tokio::test]
    async fn test_resolve_rejects_zero_slots() {
        let source = MockEventSource::new(0, Duration::from_secs(6));
        let err = ChainTiming::resolve(&source).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_resolve_failure_is_fatal() {
        let source = MockEventSource::new(32, Duration::from_secs(12)).without_chain_spec();
        assert!(matches!(
            ChainTiming::resolve(&source).await,
            Err(AggregationError::ChainSpec(SourceError::MissingSpecValue(_)))
        ));
    }
}
