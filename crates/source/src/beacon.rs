//! [`EventSource`] backed by a beacon node's REST API.

use crate::{
    BLOCK_TOPIC, EventSource, RawEventStream, SignedBeaconBlock, SourceError, SseDecoder,
};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, de::DeserializeOwned};
use std::{collections::HashMap, time::Duration};
use tracing::{debug, info, warn};
use url::Url;

const SPEC_METHOD: &str = "eth/v1/config/spec";
const EVENTS_METHOD: &str = "eth/v1/events";
const BLOCKS_METHOD: &str = "eth/v2/beacon/blocks";

const SLOTS_PER_EPOCH: &str = "SLOTS_PER_EPOCH";
const SECONDS_PER_SLOT: &str = "SECONDS_PER_SLOT";

/// Envelope of most beacon API responses.
#[derive(Debug, Deserialize)]
struct DataResponse<T> {
    data: T,
}

/// A beacon node HTTP client.
#[derive(Debug, Clone)]
pub struct BeaconClient {
    /// The base URL of the beacon node, without a trailing slash.
    base: String,
    /// The inner reqwest client.
    inner: Client,
    /// Timeout applied to every request except the event stream.
    timeout: Duration,
}

impl BeaconClient {
    /// Creates a new [`BeaconClient`] for the beacon node at `base`.
    pub fn new(base: Url, timeout: Duration) -> Self {
        Self {
            base: base.as_str().trim_end_matches('/').to_string(),
            inner: Client::new(),
            timeout,
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.base, method)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: String) -> Result<T, SourceError> {
        let res = self.inner.get(&endpoint).timeout(self.timeout).send().await?;
        if !res.status().is_success() {
            return Err(SourceError::Status { endpoint, status: res.status().as_u16() });
        }
        let bytes = res.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|source| SourceError::InvalidResponse { endpoint, source })
    }

    /// Fetches the chain config and returns the integer value stored under `key`.
    async fn spec_value(&self, key: &'static str) -> Result<u64, SourceError> {
        let spec: DataResponse<HashMap<String, serde_json::Value>> =
            self.get_json(self.endpoint(SPEC_METHOD)).await?;

        let value = spec.data.get(key).ok_or(SourceError::MissingSpecValue(key))?;
        let parsed = match value {
            serde_json::Value::String(s) => s.parse().ok(),
            serde_json::Value::Number(n) => n.as_u64(),
            _ => None,
        };
        parsed.ok_or(SourceError::MissingSpecValue(key))
    }
}

#[async_trait]
impl EventSource for BeaconClient {
    async fn slots_per_epoch(&self) -> Result<u64, SourceError> {
        let slots = self.spec_value(SLOTS_PER_EPOCH).await?;
        if slots == 0 {
            return Err(SourceError::MissingSpecValue(SLOTS_PER_EPOCH));
        }
        debug!(target: "beacon_client", slots, "Resolved slots per epoch");
        Ok(slots)
    }

    async fn slot_duration(&self) -> Result<Duration, SourceError> {
        let seconds = self.spec_value(SECONDS_PER_SLOT).await?;
        debug!(target: "beacon_client", seconds, "Resolved slot duration");
        Ok(Duration::from_secs(seconds))
    }

    async fn subscribe_blocks(&self) -> Result<RawEventStream, SourceError> {
        let endpoint = self.endpoint(EVENTS_METHOD);
        let res = self
            .inner
            .get(&endpoint)
            .query(&[("topics", BLOCK_TOPIC)])
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(SourceError::Status { endpoint, status: res.status().as_u16() });
        }
        info!(target: "beacon_client", %endpoint, "Subscribed to block events");

        let mut body = res.bytes_stream();
        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::default();
            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(chunk) => {
                        for frame in decoder.push(&chunk) {
                            yield Ok(frame);
                        }
                    }
                    Err(err) => {
                        warn!(target: "beacon_client", %err, "Block event stream failed");
                        yield Err(SourceError::Http(err));
                        return;
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }

    async fn signed_block(&self, block_id: &str) -> Result<Option<SignedBeaconBlock>, SourceError> {
        let endpoint = format!("{}/{}", self.endpoint(BLOCKS_METHOD), block_id);
        let res = self.inner.get(&endpoint).timeout(self.timeout).send().await?;
        match res.status() {
            StatusCode::NOT_FOUND => {
                debug!(target: "beacon_client", block_id, "Block not found");
                Ok(None)
            }
            status if status.is_success() => {
                let bytes = res.bytes().await?;
                serde_json::from_slice(&bytes)
                    .map(Some)
                    .map_err(|source| SourceError::InvalidResponse { endpoint, source })
            }
            status => Err(SourceError::Status { endpoint, status: status.as_u16() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SseEvent, test_utils::signed_block_json};
    use axum::{
        Json, Router,
        body::Body,
        extract::{Path, Query},
        http::HeaderMap,
        response::{IntoResponse, Response},
        routing::get,
    };
    use futures::stream;
    use serde_json::json;
    use tokio::net::TcpListener;

    /// Serves `app` on an ephemeral local port and returns its base URL.
    async fn serve(app: Router) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    async fn client(app: Router) -> BeaconClient {
        BeaconClient::new(serve(app).await, Duration::from_secs(5))
    }

    fn spec_router(spec: serde_json::Value) -> Router {
        Router::new().route(
            "/eth/v1/config/spec",
            get(move || {
                let spec = spec.clone();
                async move { Json(json!({ "data": spec })) }
            }),
        )
    }

    async fn block(Path(block_id): Path<String>) -> Response {
        match block_id.as_str() {
            "head" => Json(signed_block_json("deneb", 42, 1_042, 1_700_000_000, 3)).into_response(),
            "missing" => StatusCode::NOT_FOUND.into_response(),
            _ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }

    fn event_stream<I>(chunks: I) -> Response
    where
        I: IntoIterator<Item = Result<&'static str, std::io::Error>>,
        I::IntoIter: Send + 'static,
    {
        let body = Body::from_stream(stream::iter(chunks));
        ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
    }

    async fn events(Query(query): Query<HashMap<String, String>>, headers: HeaderMap) -> Response {
        let accept = headers.get(header::ACCEPT).and_then(|value| value.to_str().ok());
        if query.get("topics").map(String::as_str) != Some(BLOCK_TOPIC)
            || accept != Some("text/event-stream")
        {
            return StatusCode::BAD_REQUEST.into_response();
        }
        event_stream([
            Ok("event: blo"),
            Ok("ck\ndata: {\"slot\":\"1\"}\n"),
            Ok("\n: keep-alive\n\nevent: block\r\ndata: {\"slot\":\"2\"}\r\n\r\n"),
        ])
    }

    async fn broken_events() -> Response {
        event_stream([
            Ok("event: block\ndata: a\n\n"),
            Err(std::io::Error::other("connection reset")),
        ])
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = BeaconClient::new(
            Url::parse("http://localhost:5052/").unwrap(),
            Duration::from_secs(1),
        );
        assert_eq!(client.endpoint(SPEC_METHOD), "http://localhost:5052/eth/v1/config/spec");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = BeaconClient::new(
            Url::parse("http://localhost:5052/beacon").unwrap(),
            Duration::from_secs(1),
        );
        assert_eq!(
            client.endpoint(BLOCKS_METHOD),
            "http://localhost:5052/beacon/eth/v2/beacon/blocks"
        );
    }

    #[tokio::test]
    async fn test_chain_timing_from_decimal_strings() {
        let client = client(spec_router(json!({
            "SLOTS_PER_EPOCH": "32",
            "SECONDS_PER_SLOT": "12",
            "PRESET_BASE": "mainnet",
            "BLOB_SCHEDULE": [],
        })))
        .await;

        assert_eq!(client.slots_per_epoch().await.unwrap(), 32);
        assert_eq!(client.slot_duration().await.unwrap(), Duration::from_secs(12));
    }

    #[tokio::test]
    async fn test_chain_timing_from_plain_numbers() {
        let client =
            client(spec_router(json!({ "SLOTS_PER_EPOCH": 8, "SECONDS_PER_SLOT": 6 }))).await;

        assert_eq!(client.slots_per_epoch().await.unwrap(), 8);
        assert_eq!(client.slot_duration().await.unwrap(), Duration::from_secs(6));
    }

    #[tokio::test]
    async fn test_zero_slots_per_epoch_is_rejected() {
        let client =
            client(spec_router(json!({ "SLOTS_PER_EPOCH": "0", "SECONDS_PER_SLOT": "12" }))).await;

        assert!(matches!(
            client.slots_per_epoch().await,
            Err(SourceError::MissingSpecValue(SLOTS_PER_EPOCH))
        ));
    }

    #[tokio::test]
    async fn test_missing_or_malformed_spec_value() {
        let client = client(spec_router(json!({ "SLOTS_PER_EPOCH": "thirty-two" }))).await;

        assert!(matches!(
            client.slots_per_epoch().await,
            Err(SourceError::MissingSpecValue(SLOTS_PER_EPOCH))
        ));
        assert!(matches!(
            client.slot_duration().await,
            Err(SourceError::MissingSpecValue(SECONDS_PER_SLOT))
        ));
    }

    #[tokio::test]
    async fn test_signed_block_statuses() {
        let client =
            client(Router::new().route("/eth/v2/beacon/blocks/:block_id", get(block))).await;

        let found = client.signed_block("head").await.unwrap().unwrap();
        assert_eq!(found.slot(), 42);
        assert_eq!(found.version, "deneb");

        assert!(client.signed_block("missing").await.unwrap().is_none());

        let err = client.signed_block("0xdead").await.unwrap_err();
        assert!(matches!(err, SourceError::Status { status: 500, .. }), "{err}");
    }

    #[tokio::test]
    async fn test_subscribe_decodes_chunked_event_stream() {
        let client = client(Router::new().route("/eth/v1/events", get(events))).await;

        let frames: Vec<SseEvent> = client
            .subscribe_blocks()
            .await
            .unwrap()
            .map(|frame| frame.unwrap())
            .collect()
            .await;

        assert_eq!(
            frames,
            vec![
                SseEvent::new(BLOCK_TOPIC, r#"{"slot":"1"}"#),
                SseEvent::new(BLOCK_TOPIC, r#"{"slot":"2"}"#),
            ]
        );
    }

    #[tokio::test]
    async fn test_subscribe_rejected_by_node() {
        let client = client(Router::new()).await;

        let err = client.subscribe_blocks().await.err().unwrap();
        assert!(matches!(err, SourceError::Status { status: 404, .. }), "{err}");
    }

    #[tokio::test]
    async fn test_body_error_ends_event_stream() {
        let client = client(Router::new().route("/eth/v1/events", get(broken_events))).await;

        let items: Vec<_> = client.subscribe_blocks().await.unwrap().collect().await;

        let (last, frames) = items.split_last().unwrap();
        assert!(matches!(last, Err(SourceError::Http(_))));
        for frame in frames {
            assert_eq!(frame.as_ref().unwrap(), &SseEvent::new(BLOCK_TOPIC, "a"));
        }
    }

    #[test]
    fn test_spec_response_shape() {
        let spec: DataResponse<HashMap<String, serde_json::Value>> = serde_json::from_str(
            r#"{"data":{"SLOTS_PER_EPOCH":"32","SECONDS_PER_SLOT":"12","BLOB_SCHEDULE":[]}}"#,
        )
        .unwrap();
        assert_eq!(spec.data[SLOTS_PER_EPOCH], "32");
    }
}
