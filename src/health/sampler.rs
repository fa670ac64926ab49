//! Latency sampling.
//!
//! # Responsibilities
//! - Run one probe against an endpoint through the `ProbeAdapter`
//! - Enforce the adapter's deadline so a probe always returns
//! - Turn every outcome into a `Sample` (failures included)
//! - Record per-probe metrics

use std::sync::Arc;

use tokio::time;

use crate::config::EndpointConfig;
use crate::health::window::{EndpointRole, FailureKind, Sample};
use crate::observability::metrics;
use crate::probe::ProbeAdapter;

#[derive(Clone)]
pub struct LatencySampler {
    adapter: Arc<dyn ProbeAdapter>,
}

impl LatencySampler {
    pub fn new(adapter: Arc<dyn ProbeAdapter>) -> Self {
        Self { adapter }
    }

    pub fn adapter(&self) -> &Arc<dyn ProbeAdapter> {
        &self.adapter
    }

    /// Probe `endpoint` once. Never fails: errors and timeouts become failure samples.
    pub async fn probe(&self, endpoint: &EndpointConfig, role: EndpointRole) -> Sample {
        let deadline = self.adapter.deadline(endpoint);

        match time::timeout(deadline, self.adapter.measure(endpoint)).await {
            Ok(Ok(rtt)) => {
                tracing::debug!(
                    endpoint = %endpoint.name,
                    latency_ms = rtt.as_secs_f64() * 1000.0,
                    "Probe succeeded"
                );
                metrics::record_probe_rtt(&endpoint.name, rtt);
                Sample::rtt(role, rtt)
            }
            Ok(Err(err)) => {
                tracing::debug!(endpoint = %endpoint.name, error = %err, "Probe failed");
                let kind = err.failure_kind();
                metrics::record_probe_failure(&endpoint.name, kind);
                Sample::failure(role, kind)
            }
            Err(_) => {
                tracing::debug!(
                    endpoint = %endpoint.name,
                    deadline_ms = deadline.as_millis() as u64,
                    "Probe exceeded deadline"
                );
                metrics::record_probe_failure(&endpoint.name, FailureKind::Timeout);
                Sample::failure(role, FailureKind::Timeout)
            }
        }
    }
}
