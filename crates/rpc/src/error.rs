use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use epoch_indexer_storage::StorageError;
use serde_json::json;
use thiserror::Error;

/// Errors raised by the read API.
#[derive(Debug, Error)]
pub enum ReadApiError {
    /// Reading from the epoch store failed.
    #[error("failed to read epochs: {0}")]
    Storage(#[from] StorageError),

    /// The listener could not be bound or the server failed.
    #[error("read api server error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReadApiError {
    /// The HTTP status reported for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Storage(StorageError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::Storage(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ReadApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "message": self.to_string() }));
        (self.status(), body).into_response()
    }
}
