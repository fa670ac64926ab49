use axum::{extract::State, Json};
use serde::Serialize;

use crate::health::{MonitorHandle, MonitorStatus};

#[derive(Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    #[serde(flatten)]
    pub monitor: MonitorStatus,
}

pub async fn get_status(State(handle): State<MonitorHandle>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        monitor: (*handle.status()).clone(),
    })
}

pub async fn healthz() -> &'static str {
    "ok"
}
