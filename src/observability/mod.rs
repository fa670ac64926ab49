//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Sampler, controller, probe:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (probe RTT histogram, failure counters, mode gauge)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - Metric calls are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
