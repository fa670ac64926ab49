//! WebSocket link quality monitor.
//!
//! Probes a primary endpoint while online, drops into healthcheck mode when
//! latency degrades, and benchmarks a secondary endpoint until the link is good
//! enough to go back online.

pub mod admin;
pub mod config;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod probe;
pub mod resilience;

pub use config::MonitorConfig;
pub use health::{LinkMonitor, Mode, ModeEvent, MonitorHandle};
pub use lifecycle::Shutdown;
pub use probe::{ProbeAdapter, ProbeError, WsProbe};
