#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod error;
pub use error::AggregationError;

mod timing;
pub use timing::ChainTiming;

mod state;
pub use state::{AggregatorState, Transition};

mod extract;
pub use extract::block_from_signed;

mod aggregator;
pub use aggregator::{EpochAggregator, EpochReceiver};

mod persister;
pub use persister::{EpochPersister, PersistStats};

mod metrics;
pub use metrics::Metrics;
