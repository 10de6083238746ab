//! Prometheus metrics bootstrap
//!
//! The engine records its counters and gauges through the `metrics` facade
//! (observations, rejects, bars, watermark). This module installs the
//! Prometheus recorder that makes them scrapeable.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter on the given port.
///
/// Metrics become available at `http://0.0.0.0:<port>/metrics`. Without this
/// call the engine's `metrics` macros are no-ops, which is the intended
/// behavior for tests and metric-less runs.
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(%addr, "Metrics exporter listening");
    Ok(())
}
