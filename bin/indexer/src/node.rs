//! Startup wiring and shutdown of the indexer.

use anyhow::{Context, Result, bail};
use epoch_indexer_core::{EpochAggregator, EpochPersister};
use epoch_indexer_rpc::{HttpTimeouts, ReadApiServer};
use epoch_indexer_source::BeaconClient;
use epoch_indexer_storage::{EpochDb, TimedRepository};
use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use url::Url;

/// Runtime configuration of the indexer.
#[derive(Debug, Clone)]
pub(crate) struct IndexerNode {
    pub(crate) beacon_url: Url,
    pub(crate) datadir: PathBuf,
    pub(crate) rpc_addr: SocketAddr,
    pub(crate) rpc_timeouts: HttpTimeouts,
    pub(crate) store_timeout: Duration,
    pub(crate) beacon_timeout: Duration,
    pub(crate) shutdown_timeout: Duration,
}

impl IndexerNode {
    /// Starts the aggregator, the persister and the read API, and runs until a shutdown signal
    /// or until the indexing pipeline stops on its own.
    pub(crate) async fn start(self) -> Result<()> {
        let cancel = CancellationToken::new();

        let db = EpochDb::new(&self.datadir)
            .with_context(|| format!("failed to open database at {}", self.datadir.display()))?;
        let repository = Arc::new(TimedRepository::new(db, self.store_timeout, cancel.clone()));

        let server = ReadApiServer::bind(self.rpc_addr, Arc::clone(&repository))
            .await
            .with_context(|| format!("failed to bind read api to {}", self.rpc_addr))?
            .with_timeouts(self.rpc_timeouts);
        let server = tokio::spawn(server.run(cancel.clone()));

        let source = Arc::new(BeaconClient::new(self.beacon_url.clone(), self.beacon_timeout));
        let epochs = EpochAggregator::new(source, cancel.clone()).subscribe();
        let mut persister =
            tokio::spawn(EpochPersister::new(repository, epochs, cancel.clone()).run());
        info!(target: "indexer", beacon = %self.beacon_url, "Indexer started");

        let stopped_early = tokio::select! {
            signal = shutdown_signal() => {
                if let Err(err) = signal {
                    error!(target: "indexer", %err, "Failed to listen for shutdown signals");
                }
                info!(target: "indexer", "Shutdown signal received");
                false
            }
            stats = &mut persister => {
                warn!(target: "indexer", ?stats, "Indexing pipeline stopped");
                true
            }
        };
        cancel.cancel();

        let tasks = async {
            if !stopped_early {
                log_join("persister", persister.await.map(|stats| {
                    info!(target: "indexer", ?stats, "Persister finished");
                }));
            }
            log_join("read api", flatten(server).await);
        };
        if tokio::time::timeout(self.shutdown_timeout, tasks).await.is_err() {
            warn!(
                target: "indexer",
                timeout = ?self.shutdown_timeout,
                "Tasks did not finish before the shutdown timeout"
            );
        }

        if stopped_early {
            bail!("indexing pipeline stopped unexpectedly");
        }
        info!(target: "indexer", "Indexer stopped");
        Ok(())
    }
}

async fn flatten<E>(handle: JoinHandle<Result<(), E>>) -> Result<()>
where
    E: std::error::Error + Send + Sync + 'static,
{
    Ok(handle.await??)
}

fn log_join<T, E: std::fmt::Display>(task: &'static str, result: Result<T, E>) {
    if let Err(err) = result {
        error!(target: "indexer", task, %err, "Task failed");
    }
}

/// Resolves on SIGINT or, on unix, SIGTERM.
async fn shutdown_signal() -> std::io::Result<()> {
    let interrupt = tokio::signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        signal(SignalKind::terminate())?.recv().await;
        Ok::<_, std::io::Error>(())
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<std::io::Result<()>>();

    tokio::select! {
        res = interrupt => res,
        res = terminate => res,
    }
}
