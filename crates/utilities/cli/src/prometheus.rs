//! Utilities for spinning up a prometheus metrics server.

use crate::PrometheusError;
use metrics_exporter_prometheus::PrometheusBuilder;
use metrics_process::Collector;
use std::{
    net::{IpAddr, SocketAddr, TcpListener},
    thread::{self, sleep},
    time::Duration,
};
use tracing::info;

/// Interval between two samples of the process collector.
const PROCESS_SAMPLE_INTERVAL: Duration = Duration::from_secs(60);

/// Start a Prometheus metrics server on the given address and port.
///
/// Port `0` is resolved to a free port before the exporter binds it.
pub fn init_prometheus_server(addr: IpAddr, metrics_port: u16) -> Result<(), PrometheusError> {
    let actual_addr = if metrics_port == 0 {
        let listener = TcpListener::bind((addr, 0))?;
        listener.local_addr()?
    } else {
        SocketAddr::from((addr, metrics_port))
    };

    PrometheusBuilder::new().with_http_listener(actual_addr).install()?;

    // Process metrics: CPU, memory, open fds.
    let collector = Collector::default();
    collector.describe();
    thread::spawn(move || {
        loop {
            collector.collect();
            sleep(PROCESS_SAMPLE_INTERVAL);
        }
    });

    info!(target: "prometheus", "Serving metrics at: http://{}", actual_addr);
    Ok(())
}
