//! Endpoint probing.
//!
//! # Responsibilities
//! - Define the capability the monitor needs: "measure RTT to endpoint E"
//! - Provide a WebSocket ping/pong implementation (websocket.rs)
//!
//! # Design Decisions
//! - Transport agnostic: the monitor only sees `ProbeAdapter`
//! - Every adapter declares a deadline; the sampler enforces it
//! - Errors are data, never fatal: each becomes a failure sample

pub mod websocket;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::EndpointConfig;
use crate::health::window::FailureKind;

pub use websocket::WsProbe;

/// Why a probe produced no round-trip time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("connect failed: {0}")]
    Connect(String),

    #[error("connection closed by peer")]
    Closed,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("reconnect backing off for {0:?}")]
    Backoff(Duration),
}

impl ProbeError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ProbeError::Timeout(_) => FailureKind::Timeout,
            _ => FailureKind::Error,
        }
    }
}

/// Measures round-trip time against an endpoint.
///
/// Implementations must return within [`ProbeAdapter::deadline`]; the sampler
/// cancels the call at that point regardless.
#[async_trait]
pub trait ProbeAdapter: Send + Sync {
    async fn measure(&self, endpoint: &EndpointConfig) -> Result<Duration, ProbeError>;

    /// Upper bound on one `measure` call, including any connection setup.
    fn deadline(&self, endpoint: &EndpointConfig) -> Duration {
        endpoint.timeout()
    }

    /// Called when `endpoint` stops being the probed one.
    async fn release(&self, _endpoint: &EndpointConfig) {}
}
