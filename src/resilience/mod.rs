//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Probe needs a connection:
//!     → backoff.rs (is a reconnect allowed yet?)
//!     → connect attempt bounded by connection.connect_timeout_ms
//!     → on failure: backoff.rs schedules the next allowed attempt
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline
//! - No retries inside a probe cycle; the next cycle is the retry
//! - While backing off, probes fail fast instead of waiting

pub mod backoff;
