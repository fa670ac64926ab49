//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → every subscribed task observes the broadcast → tasks exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - One broadcast fans out to the monitor loop and the admin server
//! - The monitor drops any in-flight probe instead of waiting on it

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
