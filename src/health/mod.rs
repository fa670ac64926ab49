//! Link health subsystem.
//!
//! # Data Flow
//! ```text
//! monitor.rs (timer tick)
//!     → sampler.rs probes the active endpoint through the ProbeAdapter
//!     → controller.rs records the Sample into window.rs
//!     → evaluator.rs reduces the window to a HealthVerdict
//!     → controller.rs transitions Online ⇄ Healthcheck when warranted
//!     → notify.rs publishes the ModeEvent
//! ```
//!
//! # Design Decisions
//! - Bad and good thresholds differ (hysteresis) to prevent flapping
//! - A fresh window per mode: stale samples never judge recovery
//! - A single task owns the controller; readers see snapshots

pub mod controller;
pub mod evaluator;
pub mod monitor;
pub mod notify;
pub mod sampler;
pub mod window;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serializer;

pub use controller::{Mode, ModeController};
pub use evaluator::{HealthEvaluator, HealthVerdict};
pub use monitor::{LinkMonitor, MonitorHandle, MonitorStatus};
pub use notify::{ModeEvent, ModeNotifier, NotifyError};
pub use sampler::LatencySampler;
pub use window::{EndpointRole, FailureKind, ProbeOutcome, Sample, SlidingWindow};

/// Serialize a timestamp as milliseconds since the Unix epoch.
pub(crate) fn serialize_unix_ms<S: Serializer>(at: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
    let millis = at
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    serializer.serialize_u64(millis)
}
