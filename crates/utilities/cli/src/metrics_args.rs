//! Prometheus exporter arguments.

use crate::{CliResult, init_prometheus_server};
use clap::Parser;
use std::net::{IpAddr, Ipv4Addr};

/// Configuration of the Prometheus metrics exporter.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct MetricsArgs {
    /// Serve Prometheus metrics.
    #[arg(long = "metrics.enabled", env = "METRICS_ENABLED", default_value_t = false)]
    pub enabled: bool,
    /// Address the metrics server listens on.
    #[arg(
        long = "metrics.addr",
        env = "METRICS_ADDR",
        default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    )]
    pub addr: IpAddr,
    /// Port the metrics server listens on. `0` picks a free port.
    #[arg(long = "metrics.port", env = "METRICS_PORT", default_value_t = 9090)]
    pub port: u16,
}

impl Default for MetricsArgs {
    fn default() -> Self {
        Self { enabled: false, addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 9090 }
    }
}

impl MetricsArgs {
    /// Starts the exporter if metrics are enabled.
    ///
    /// Returns whether a recorder was installed.
    pub fn init_metrics(&self) -> CliResult<bool> {
        if !self.enabled {
            return Ok(false);
        }
        init_prometheus_server(self.addr, self.port)?;
        Ok(true)
    }
}
