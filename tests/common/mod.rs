//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

use linkwatch::config::{Aggregation, EndpointConfig, EvaluationConfig, MonitorConfig};
use linkwatch::probe::{ProbeAdapter, ProbeError};

/// Adapter that replays scripted outcomes per endpoint name.
///
/// Once an endpoint's script runs out, `fallback` is returned for it.
pub struct ScriptedProbe {
    scripts: Mutex<HashMap<String, VecDeque<Result<Duration, ProbeError>>>>,
    fallback: Result<Duration, ProbeError>,
    probed: Mutex<Vec<String>>,
    released: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn new(fallback: Result<Duration, ProbeError>) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            fallback,
            probed: Mutex::new(Vec::new()),
            released: Mutex::new(Vec::new()),
        }
    }

    /// Queue RTTs in milliseconds for `endpoint`.
    pub fn script_ms(self, endpoint: &str, rtts: &[u64]) -> Self {
        let outcomes = rtts.iter().map(|ms| Ok(Duration::from_millis(*ms))).collect();
        self.script(endpoint, outcomes)
    }

    pub fn script(self, endpoint: &str, outcomes: Vec<Result<Duration, ProbeError>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(endpoint.to_string())
            .or_default()
            .extend(outcomes);
        self
    }

    /// Endpoint names in the order they were probed.
    pub fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }

    pub fn released(&self) -> Vec<String> {
        self.released.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProbeAdapter for ScriptedProbe {
    async fn measure(&self, endpoint: &EndpointConfig) -> Result<Duration, ProbeError> {
        self.probed.lock().unwrap().push(endpoint.name.clone());
        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&endpoint.name)
            .and_then(VecDeque::pop_front);
        next.unwrap_or_else(|| self.fallback.clone())
    }

    async fn release(&self, endpoint: &EndpointConfig) {
        self.released.lock().unwrap().push(endpoint.name.clone());
    }
}

/// N=5, bad=500ms, good=150ms, min-samples=3 on both endpoints.
pub fn scenario_config() -> MonitorConfig {
    let mut config = MonitorConfig::default();
    for endpoint in [&mut config.primary, &mut config.healthcheck] {
        endpoint.url = "ws://127.0.0.1:9/".to_string();
        endpoint.bad_threshold_ms = 500;
        endpoint.good_threshold_ms = 150;
    }
    config.evaluation = EvaluationConfig {
        window_size: 5,
        min_samples: 3,
        aggregation: Aggregation::Consecutive,
    };
    config
}

async fn serve_pongs(socket: TcpStream) {
    let Ok(mut ws) = tokio_tungstenite::accept_async(socket).await else {
        return;
    };
    // Reading drives the automatic pong replies.
    while let Some(Ok(msg)) = ws.next().await {
        if msg.is_close() {
            break;
        }
    }
}

/// WebSocket server that answers pings and discards everything else.
pub async fn start_ws_echo_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(serve_pongs(socket));
        }
    });

    addr
}

/// WebSocket server whose first connection stalls after the handshake while
/// every later connection answers pings. Returns the accepted connection count.
pub async fn start_stalled_first_ws_server() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::spawn(async move {
                    let _ws = tokio_tungstenite::accept_async(socket).await;
                    std::future::pending::<()>().await;
                });
            } else {
                tokio::spawn(serve_pongs(socket));
            }
        }
    });

    (addr, accepted)
}

/// WebSocket server that pushes `count` text frames after the handshake and
/// then answers pings.
pub async fn start_chatty_ws_server(count: usize) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(socket).await else {
                    return;
                };
                for i in 0..count {
                    if ws.send(Message::text(format!("update {i}"))).await.is_err() {
                        return;
                    }
                }
                while let Some(Ok(msg)) = ws.next().await {
                    if msg.is_close() {
                        break;
                    }
                }
            });
        }
    });

    addr
}

/// WebSocket server that completes the handshake and then never reads again.
pub async fn start_silent_ws_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ws = tokio_tungstenite::accept_async(socket).await;
                std::future::pending::<()>().await;
            });
        }
    });

    addr
}

/// WebSocket server that closes every connection right after the handshake.
pub async fn start_closing_ws_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                if let Ok(mut ws) = tokio_tungstenite::accept_async(socket).await {
                    let _ = ws.close(None).await;
                    while let Some(Ok(_)) = ws.next().await {}
                }
            });
        }
    });

    addr
}

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn ws_url(addr: SocketAddr) -> String {
    format!("ws://{}/", addr)
}
