//! Read-only status API.
//!
//! # Routes
//! - `GET /status`: current mode, last verdict and window summary as JSON
//! - `GET /healthz`: liveness of the process

pub mod handlers;

use std::net::SocketAddr;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::health::MonitorHandle;
use self::handlers::{get_status, healthz};

pub fn admin_router(handle: MonitorHandle) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/healthz", get(healthz))
        .with_state(handle)
        .layer(TraceLayer::new_for_http())
}

/// Serve the status API until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    handle: MonitorHandle,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    let addr: SocketAddr = listener.local_addr()?;
    tracing::info!(address = %addr, "Admin API listening");

    axum::serve(listener, admin_router(handle))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    tracing::info!("Admin API stopped");
    Ok(())
}
