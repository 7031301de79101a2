//! Error types for the event source.

use thiserror::Error;

/// Errors returned by an [`EventSource`](crate::EventSource).
#[derive(Debug, Error)]
pub enum SourceError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The beacon node answered with a non-success status.
    #[error("unexpected status {status} from {endpoint}")]
    Status {
        /// The endpoint that was requested.
        endpoint: String,
        /// The returned HTTP status code.
        status: u16,
    },

    /// The response body did not have the expected shape.
    #[error("invalid response from {endpoint}: {source}")]
    InvalidResponse {
        /// The endpoint that was requested.
        endpoint: String,
        /// The underlying decoding error.
        #[source]
        source: serde_json::Error,
    },

    /// A required chain spec value is missing or not an integer.
    #[error("chain spec value {0} is missing or malformed")]
    MissingSpecValue(&'static str),

    /// The source was asked for something it cannot provide.
    #[error("event source unavailable: {0}")]
    Unavailable(String),
}
