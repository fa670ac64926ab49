//! Metrics collection and exposition.
//!
//! # Metrics
//! - `linkwatch_probe_rtt_seconds{endpoint}` (histogram): successful probe RTT
//! - `linkwatch_probe_failures_total{endpoint,kind}` (counter): timeouts and errors
//! - `linkwatch_mode` (gauge): 1=online, 0=healthcheck
//! - `linkwatch_mode_transitions_total{to}` (counter)

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::health::controller::Mode;
use crate::health::window::FailureKind;

/// Buckets for WebSocket ping RTT, 5ms up to 5s.
const RTT_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.15, 0.2, 0.3, 0.5, 1.0, 2.0, 5.0];

/// Install the Prometheus recorder and its scrape listener on `addr`.
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets(RTT_BUCKETS)?
        .install()?;

    describe_histogram!("linkwatch_probe_rtt_seconds", "Round-trip time of successful probes");
    describe_counter!("linkwatch_probe_failures_total", "Probes that timed out or errored");
    describe_gauge!("linkwatch_mode", "Current link mode (1=online, 0=healthcheck)");
    describe_counter!("linkwatch_mode_transitions_total", "Link mode transitions by target mode");

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_probe_rtt(endpoint: &str, rtt: Duration) {
    histogram!("linkwatch_probe_rtt_seconds", "endpoint" => endpoint.to_string())
        .record(rtt.as_secs_f64());
}

pub fn record_probe_failure(endpoint: &str, kind: FailureKind) {
    counter!(
        "linkwatch_probe_failures_total",
        "endpoint" => endpoint.to_string(),
        "kind" => kind.as_str()
    )
    .increment(1);
}

pub fn record_mode(mode: Mode) {
    let value = match mode {
        Mode::Online => 1.0,
        Mode::Healthcheck => 0.0,
    };
    gauge!("linkwatch_mode").set(value);
}

pub fn record_transition(to: Mode) {
    counter!("linkwatch_mode_transitions_total", "to" => to.as_str()).increment(1);
    record_mode(to);
}
