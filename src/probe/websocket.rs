//! WebSocket ping/pong probe.
//!
//! # Responsibilities
//! - Keep one persistent connection per endpoint URL
//! - Measure RTT as the time from Ping(nonce) to the matching Pong
//! - Reconnect lazily, gated by exponential backoff
//!
//! # Data Flow
//! ```text
//! measure(endpoint)
//!     → backing off? fail fast
//!     → no connection? connect (bounded by connect_timeout)
//!     → send Ping(nonce), read until Pong(nonce) (bounded by endpoint timeout)
//! ```
//!
//! # Design Decisions
//! - Any failed probe, timeouts included, drops the connection; the next probe
//!   starts from a fresh handshake
//! - Pongs with another nonce are skipped
//! - Frames are only read while a probe runs. Whatever the server pushed since
//!   the last probe is drained before the clock starts; frames arriving during
//!   the probe are logged and dropped inside the measured RTT

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::{FutureExt, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::config::{ConnectionConfig, EndpointConfig};
use crate::probe::{ProbeAdapter, ProbeError};
use crate::resilience::backoff::ReconnectBackoff;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Bound on the close handshake when releasing a connection.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

struct Link {
    stream: Option<WsStream>,
    backoff: ReconnectBackoff,
}

pub struct WsProbe {
    connection: ConnectionConfig,
    links: Mutex<HashMap<String, Link>>,
    nonce: AtomicU64,
}

impl WsProbe {
    pub fn new(connection: ConnectionConfig) -> Self {
        Self {
            connection,
            links: Mutex::new(HashMap::new()),
            nonce: AtomicU64::new(1),
        }
    }

    /// Whether a connection to `url` is currently held open.
    pub async fn is_connected(&self, url: &str) -> bool {
        self.links
            .lock()
            .await
            .get(url)
            .is_some_and(|link| link.stream.is_some())
    }

    fn new_link(&self) -> Link {
        Link {
            stream: None,
            backoff: ReconnectBackoff::new(
                Duration::from_millis(self.connection.reconnect_base_delay_ms),
                Duration::from_millis(self.connection.reconnect_max_delay_ms),
            ),
        }
    }

    async fn connect(&self, link: &mut Link, endpoint: &EndpointConfig) -> Result<(), ProbeError> {
        if let Some(remaining) = link.backoff.remaining(Instant::now()) {
            return Err(ProbeError::Backoff(remaining));
        }

        let connect_timeout = self.connection.connect_timeout();
        let err = match timeout(connect_timeout, connect_async(endpoint.url.as_str())).await {
            Ok(Ok((stream, _response))) => {
                tracing::info!(endpoint = %endpoint.name, url = %endpoint.url, "Connected to WebSocket endpoint");
                link.backoff.record_success();
                link.stream = Some(stream);
                return Ok(());
            }
            Ok(Err(e)) => ProbeError::Connect(e.to_string()),
            Err(_) => ProbeError::Timeout(connect_timeout),
        };

        let delay = link.backoff.record_failure(Instant::now());
        tracing::warn!(
            endpoint = %endpoint.name,
            url = %endpoint.url,
            error = %err,
            attempt = link.backoff.failures(),
            retry_in_ms = delay.as_millis() as u64,
            "WebSocket connect failed"
        );
        Err(err)
    }
}

#[async_trait]
impl ProbeAdapter for WsProbe {
    async fn measure(&self, endpoint: &EndpointConfig) -> Result<Duration, ProbeError> {
        let mut links = self.links.lock().await;
        let link = links
            .entry(endpoint.url.clone())
            .or_insert_with(|| self.new_link());

        if link.stream.is_none() {
            self.connect(link, endpoint).await?;
        }
        let Some(stream) = link.stream.as_mut() else {
            return Err(ProbeError::Closed);
        };

        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed).to_be_bytes();
        let result = match drain_pending(stream) {
            Ok(()) => {
                let started = Instant::now();
                match timeout(endpoint.timeout(), ping_pong(stream, &nonce)).await {
                    Ok(Ok(())) => Ok(started.elapsed()),
                    Ok(Err(err)) => Err(err),
                    Err(_) => Err(ProbeError::Timeout(endpoint.timeout())),
                }
            }
            Err(err) => Err(err),
        };

        if let Err(err) = &result {
            // A wedged or half-open socket never answers again; reconnect instead.
            tracing::debug!(endpoint = %endpoint.name, error = %err, "Dropping WebSocket connection");
            link.stream = None;
        }
        result
    }

    fn deadline(&self, endpoint: &EndpointConfig) -> Duration {
        self.connection.connect_timeout() + endpoint.timeout()
    }

    async fn release(&self, endpoint: &EndpointConfig) {
        let stream = self
            .links
            .lock()
            .await
            .get_mut(&endpoint.url)
            .and_then(|link| link.stream.take());

        if let Some(mut stream) = stream {
            if timeout(CLOSE_TIMEOUT, stream.close(None)).await.is_err() {
                tracing::info!(endpoint = %endpoint.name, "WebSocket close timed out");
            }
            tracing::info!(endpoint = %endpoint.name, "WebSocket connection released");
        }
    }
}

/// Consume frames that are already buffered without waiting for more.
fn drain_pending(stream: &mut WsStream) -> Result<(), ProbeError> {
    while let Some(frame) = stream.next().now_or_never() {
        match frame {
            Some(Ok(Message::Close(_))) | None => return Err(ProbeError::Closed),
            Some(Ok(other)) => tracing::trace!(len = other.len(), "Discarding message received between probes"),
            Some(Err(e)) => return Err(map_ws_error(e)),
        }
    }
    Ok(())
}

async fn ping_pong(stream: &mut WsStream, nonce: &[u8]) -> Result<(), ProbeError> {
    stream
        .send(Message::Ping(nonce.to_vec().into()))
        .await
        .map_err(map_ws_error)?;

    while let Some(frame) = stream.next().await {
        match frame.map_err(map_ws_error)? {
            Message::Pong(payload) if &payload[..] == nonce => return Ok(()),
            Message::Pong(_) => tracing::trace!("Skipping stale pong"),
            Message::Close(_) => return Err(ProbeError::Closed),
            other => tracing::debug!(len = other.len(), "Ignoring message received while probing"),
        }
    }
    Err(ProbeError::Closed)
}

fn map_ws_error(err: tungstenite::Error) -> ProbeError {
    match err {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => ProbeError::Closed,
        other => ProbeError::Protocol(other.to_string()),
    }
}
