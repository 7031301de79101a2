#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod error;
pub use error::ReadApiError;

mod router;
pub use router::{HttpTimeouts, NO_BLOCKS_MESSAGE, router};

mod server;
pub use server::ReadApiServer;
