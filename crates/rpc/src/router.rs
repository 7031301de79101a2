//! Routes of the read API.

use crate::ReadApiError;
use axum::{
    Json, Router,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use epoch_indexer_storage::EpochRepository;
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tower_http::timeout::{RequestBodyTimeoutLayer, TimeoutLayer};
use tracing::{debug, error};

/// Body returned by `GET /` while the store is empty.
pub const NO_BLOCKS_MESSAGE: &str = "no blocks yet";

/// Time limits applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// Limit for receiving the request body.
    pub read: Duration,
    /// Limit for producing the response. Exceeding it answers `408 Request Timeout`.
    pub write: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { read: Duration::from_secs(1), write: Duration::from_secs(5) }
    }
}

/// Builds the read API router over `repository`.
pub fn router<R>(repository: Arc<R>, timeouts: HttpTimeouts) -> Router
where
    R: EpochRepository + 'static,
{
    Router::new()
        .route("/", get(get_epochs::<R>).fallback(method_not_allowed))
        .fallback(fallback)
        .layer(RequestBodyTimeoutLayer::new(timeouts.read))
        .layer(TimeoutLayer::new(timeouts.write))
        .with_state(repository)
}

async fn get_epochs<R>(State(repository): State<Arc<R>>) -> Result<Response, ReadApiError>
where
    R: EpochRepository,
{
    let epochs = repository.get().await.inspect_err(|err| {
        error!(target: "read_api", %err, "Failed to read epochs");
    })?;
    debug!(target: "read_api", epochs = epochs.len(), "Serving epochs");

    if epochs.is_empty() {
        return Ok(Json(json!({ "message": NO_BLOCKS_MESSAGE })).into_response());
    }
    Ok(Json(epochs).into_response())
}

/// The method is checked before the path: only `GET` requests can be answered `404`.
async fn fallback(method: Method) -> (StatusCode, &'static str) {
    if method == Method::GET {
        (StatusCode::NOT_FOUND, "Not Found")
    } else {
        method_not_allowed().await
    }
}

async fn method_not_allowed() -> (StatusCode, &'static str) {
    (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::Request,
    };
    use epoch_indexer_storage::{StorageError, test_utils::InMemoryRepository};
    use epoch_indexer_types::{Block, Epoch, Slot};
    use tower::ServiceExt;

    fn epoch(number: u64) -> Epoch {
        let block = Block {
            block_number: 500 + number,
            block_root: format!("0x{number:064x}"),
            state_root: format!("0x{:064x}", number + 1),
            slot_number: number * 32,
            gas_limit: 30_000_000,
            gas_used: 21_000,
            no_of_transactions: 1,
            created_at: 1_000 + number,
            degraded: false,
        };
        let slot = Slot::new(number, Duration::from_secs(12), block);
        Epoch::from_slots(number, Duration::from_secs(384), vec![slot])
    }

    /// A repository whose reads take longer than any test timeout.
    #[derive(Debug)]
    struct SlowRepository;

    #[async_trait]
    impl EpochRepository for SlowRepository {
        async fn create(&self, _: Epoch) -> Result<(), StorageError> {
            Ok(())
        }

        async fn get(&self) -> Result<Vec<Epoch>, StorageError> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(vec![epoch(1)])
        }

        async fn prune(&self, _: u64) -> Result<usize, StorageError> {
            Ok(0)
        }
    }

    async fn send<R: EpochRepository + 'static>(
        repository: R,
        timeouts: HttpTimeouts,
        method: Method,
        uri: &str,
    ) -> (StatusCode, String) {
        let app = router(Arc::new(repository), timeouts);
        let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn call(
        repository: InMemoryRepository,
        method: Method,
        uri: &str,
    ) -> (StatusCode, serde_json::Value) {
        let (status, body) = send(repository, HttpTimeouts::default(), method, uri).await;
        (status, serde_json::from_str(&body).unwrap_or(serde_json::Value::Null))
    }

    #[tokio::test]
    async fn test_empty_store_reports_no_blocks() {
        let (status, body) = call(InMemoryRepository::default(), Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "no blocks yet" }));
    }

    #[tokio::test]
    async fn test_lists_epochs_in_order() {
        let repository = InMemoryRepository::with_epochs([epoch(9), epoch(8)]);
        let (status, body) = call(repository, Method::GET, "/").await;

        assert_eq!(status, StatusCode::OK);
        let epochs = body.as_array().unwrap();
        assert_eq!(epochs.len(), 2);
        assert_eq!(epochs[0]["epochNumber"], 8);
        assert_eq!(epochs[1]["epochNumber"], 9);

        let slot = &epochs[0]["slots"][0];
        assert_eq!(slot["slotNumber"], 256);
        assert_eq!(slot["startTime"], "1970-01-01T00:16:48Z");
        assert_eq!(slot["endTime"], "1970-01-01T00:17:00Z");
        assert_eq!(slot["block"]["blockNumber"], 508);
        assert_eq!(slot["block"]["gasLimit"], 30_000_000);
        assert_eq!(slot["block"]["gasUsed"], 21_000);
        assert_eq!(slot["block"]["noOfTransactions"], 1);
        assert_eq!(slot["block"]["blockRoot"], format!("0x{:064x}", 8));
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let (status, body) =
            send(InMemoryRepository::default(), HttpTimeouts::default(), Method::GET, "/epochs")
                .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Not Found");
    }

    #[tokio::test]
    async fn test_other_methods_are_not_allowed() {
        for (method, uri) in [
            (Method::POST, "/"),
            (Method::PUT, "/"),
            (Method::DELETE, "/"),
            (Method::POST, "/epochs"),
            (Method::PATCH, "/a/b"),
        ] {
            let (status, body) =
                send(InMemoryRepository::default(), HttpTimeouts::default(), method, uri).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{uri}");
            assert_eq!(body, "Method Not Allowed");
        }
    }

    #[tokio::test]
    async fn test_storage_failure_is_internal_error() {
        let repository = InMemoryRepository::default()
            .failing_with(|| StorageError::EntryNotFound("epochs table".into()));
        let (status, body) = call(repository, Method::GET, "/").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["message"].as_str().unwrap().contains("epochs table"));
    }

    #[tokio::test]
    async fn test_storage_timeout_is_gateway_timeout() {
        let repository = InMemoryRepository::default()
            .failing_with(|| StorageError::Timeout(Duration::from_secs(5)));
        let (status, body) = call(repository, Method::GET, "/").await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_slow_response_hits_write_timeout() {
        let timeouts =
            HttpTimeouts { read: Duration::from_secs(1), write: Duration::from_millis(20) };
        let (status, _) = send(SlowRepository, timeouts, Method::GET, "/").await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn test_slow_response_within_write_timeout_succeeds() {
        let timeouts = HttpTimeouts { read: Duration::from_secs(1), write: Duration::from_secs(5) };
        let (status, _) = send(SlowRepository, timeouts, Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);
    }
}
