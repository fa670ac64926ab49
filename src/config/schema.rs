//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the link monitor.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Endpoint probed while online.
    pub primary: EndpointConfig,

    /// Endpoint probed while in healthcheck mode.
    #[serde(default = "EndpointConfig::healthcheck")]
    pub healthcheck: EndpointConfig,

    /// Window and aggregation settings.
    pub evaluation: EvaluationConfig,

    /// Connection settings for the WebSocket probe.
    pub connection: ConnectionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Read-only status API.
    pub admin: AdminConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            primary: EndpointConfig::default(),
            healthcheck: EndpointConfig::healthcheck(),
            evaluation: EvaluationConfig::default(),
            connection: ConnectionConfig::default(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

/// One probed endpoint and its latency thresholds.
///
/// Fields missing from a config table fall back to the primary defaults.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct EndpointConfig {
    /// Identifier used in logs and metric labels.
    pub name: String,

    /// WebSocket URL (ws:// or wss://).
    pub url: String,

    /// Delay between probe cycles in milliseconds.
    pub probe_interval_ms: u64,

    /// Upper bound on a single probe in milliseconds.
    pub timeout_ms: u64,

    /// Aggregate latency at or above this is bad.
    pub bad_threshold_ms: u64,

    /// Aggregate latency below this is good.
    pub good_threshold_ms: u64,
}

impl EndpointConfig {
    /// Defaults for the recovery endpoint. Probes twice as often as the primary.
    pub fn healthcheck() -> Self {
        Self {
            name: "healthcheck".to_string(),
            probe_interval_ms: 500,
            ..Self::default()
        }
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn thresholds(&self) -> LatencyThresholds {
        LatencyThresholds {
            bad: Duration::from_millis(self.bad_threshold_ms),
            good: Duration::from_millis(self.good_threshold_ms),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            name: "primary".to_string(),
            url: "wss://echo.websocket.events/".to_string(),
            probe_interval_ms: 1000,
            timeout_ms: 1000,
            bad_threshold_ms: 200,
            good_threshold_ms: 150,
        }
    }
}

/// Bad/good cutoffs for one endpoint. `good` must be strictly below `bad`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyThresholds {
    pub bad: Duration,
    pub good: Duration,
}

/// Sliding window and verdict policy.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Window capacity (N).
    pub window_size: usize,

    /// Samples required before a non-neutral verdict is produced.
    pub min_samples: usize,

    /// How the window is reduced to a verdict.
    pub aggregation: Aggregation,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            min_samples: 5,
            aggregation: Aggregation::Consecutive,
        }
    }
}

/// Aggregation policy applied by the health evaluator.
///
/// Failed probes count as infinitely slow under every policy.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Aggregation {
    /// The trailing `min_samples` samples must all be past a threshold.
    #[default]
    Consecutive,
    /// Mean latency over the whole window.
    Mean,
    /// Nearest-rank percentile over the whole window.
    Percentile { p: f64 },
    /// Majority vote: at least `min_bad_count` samples at or above the bad
    /// threshold for Bad, at least `min_good_count` below the good one for Good.
    Count {
        min_bad_count: usize,
        min_good_count: usize,
    },
}

/// Connection management for the WebSocket probe.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Bound on establishing a WebSocket connection in milliseconds.
    pub connect_timeout_ms: u64,

    /// Base delay for reconnect backoff in milliseconds.
    pub reconnect_base_delay_ms: u64,

    /// Maximum reconnect backoff in milliseconds.
    pub reconnect_max_delay_ms: u64,
}

impl ConnectionConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5000,
            reconnect_base_delay_ms: 500,
            reconnect_max_delay_ms: 10_000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin status API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the status API.
    pub enabled: bool,

    /// Status API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
