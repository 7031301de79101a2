//! The read API server.

use crate::{HttpTimeouts, ReadApiError, router};
use epoch_indexer_storage::EpochRepository;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A bound read API server.
#[derive(Debug)]
pub struct ReadApiServer<R> {
    listener: TcpListener,
    repository: Arc<R>,
    timeouts: HttpTimeouts,
}

impl<R> ReadApiServer<R>
where
    R: EpochRepository + 'static,
{
    /// Binds the server to `addr`.
    pub async fn bind(addr: SocketAddr, repository: Arc<R>) -> Result<Self, ReadApiError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, repository, timeouts: HttpTimeouts::default() })
    }

    /// Sets the per-request time limits.
    pub fn with_timeouts(mut self, timeouts: HttpTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// The address the server is listening on.
    pub fn local_addr(&self) -> Result<SocketAddr, ReadApiError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves requests until `cancel` fires, then waits for in-flight requests to finish.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ReadApiError> {
        let addr = self.local_addr()?;
        info!(target: "read_api", %addr, timeouts = ?self.timeouts, "Read API listening");

        axum::serve(self.listener, router(self.repository, self.timeouts))
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await?;

        info!(target: "read_api", "Read API stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epoch_indexer_storage::test_utils::InMemoryRepository;
    use std::time::Duration;

    #[tokio::test]
    async fn test_serves_until_cancelled() {
        let repository = Arc::new(InMemoryRepository::default());
        let server = ReadApiServer::bind(([127, 0, 0, 1], 0).into(), repository)
            .await
            .unwrap()
            .with_timeouts(HttpTimeouts {
                read: Duration::from_millis(500),
                write: Duration::from_secs(2),
            });
        let addr = server.local_addr().unwrap();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(server.run(cancel.clone()));

        let body: serde_json::Value =
            reqwest::get(format!("http://{addr}/")).await.unwrap().json().await.unwrap();
        assert_eq!(body["message"], "no blocks yet");

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap().unwrap();
    }
}
