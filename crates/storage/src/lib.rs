#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod error;
pub use error::StorageError;

mod models;

mod providers;

mod traits;
pub use traits::{EpochStorageReader, EpochStorageWriter};

mod epochdb;
pub use epochdb::EpochDb;

mod repository;
pub use repository::{EpochRepository, TimedRepository};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
