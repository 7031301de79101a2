//! Contains the indexer CLI.

use crate::node::IndexerNode;
use anyhow::Result;
use clap::Parser;
use epoch_indexer_cli::{LogArgs, MetricsArgs, cli_styles};
use epoch_indexer_core::Metrics;
use epoch_indexer_rpc::HttpTimeouts;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};
use url::Url;

/// Indexes beacon chain blocks into epochs, keeps the most recent ones and serves them over HTTP.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, styles = cli_styles(), long_about = None)]
pub(crate) struct Cli {
    /// Logging arguments.
    #[command(flatten)]
    pub(crate) log_args: LogArgs,
    /// Prometheus arguments.
    #[command(flatten)]
    pub(crate) metrics: MetricsArgs,
    /// URL of the beacon node REST API.
    #[arg(long = "beacon-url", visible_alias = "client-url", env = "BEACON_URL")]
    pub(crate) beacon_url: Url,
    /// Directory holding the epoch database.
    #[arg(long, env = "DATADIR")]
    pub(crate) datadir: PathBuf,
    /// Address the read API listens on.
    #[arg(
        long = "rpc.addr",
        env = "RPC_ADDR",
        default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    )]
    pub(crate) rpc_addr: IpAddr,
    /// Port the read API listens on.
    #[arg(long = "rpc.port", env = "RPC_PORT", default_value_t = 8080)]
    pub(crate) rpc_port: u16,
    /// Seconds the read API waits for a request body.
    #[arg(long = "rpc.read-timeout", env = "RPC_READ_TIMEOUT", default_value_t = 1)]
    pub(crate) rpc_read_timeout: u64,
    /// Seconds the read API may take to produce a response.
    #[arg(long = "rpc.write-timeout", env = "RPC_WRITE_TIMEOUT", default_value_t = 5)]
    pub(crate) rpc_write_timeout: u64,
    /// Seconds a single storage operation may take.
    #[arg(long = "store.timeout", env = "STORE_TIMEOUT", default_value_t = 5)]
    pub(crate) store_timeout: u64,
    /// Seconds a single beacon node request may take.
    #[arg(long = "beacon.timeout", env = "BEACON_TIMEOUT", default_value_t = 10)]
    pub(crate) beacon_timeout: u64,
    /// Seconds to wait for running tasks after a shutdown signal.
    #[arg(long = "shutdown.timeout", env = "SHUTDOWN_TIMEOUT", default_value_t = 2)]
    pub(crate) shutdown_timeout: u64,
}

impl Cli {
    /// Runs the CLI.
    pub(crate) fn run(self) -> Result<()> {
        self.init_stack()?;

        let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
        rt.block_on(IndexerNode::from(self).start())
    }

    /// Initializes tracing and, when enabled, the Prometheus exporter.
    fn init_stack(&self) -> Result<()> {
        self.log_args.init_tracing_subscriber(None)?;
        if self.metrics.init_metrics()? {
            Metrics::init();
        }
        Ok(())
    }

    /// The socket address of the read API.
    pub(crate) const fn rpc_socket(&self) -> SocketAddr {
        SocketAddr::new(self.rpc_addr, self.rpc_port)
    }
}

impl From<Cli> for IndexerNode {
    fn from(cli: Cli) -> Self {
        Self {
            beacon_url: cli.beacon_url,
            datadir: cli.datadir,
            rpc_addr: cli.rpc_socket(),
            rpc_timeouts: HttpTimeouts {
                read: Duration::from_secs(cli.rpc_read_timeout),
                write: Duration::from_secs(cli.rpc_write_timeout),
            },
            store_timeout: Duration::from_secs(cli.store_timeout),
            beacon_timeout: Duration::from_secs(cli.beacon_timeout),
            shutdown_timeout: Duration::from_secs(cli.shutdown_timeout),
        }
    }
}
