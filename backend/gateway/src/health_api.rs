//! Gateway Health API

use axum::{Json, extract::State};
use serde::Serialize;

use crate::server::GatewayState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub store: String,
    pub uptime_seconds: u64,
}

/// Handler for `GET /api/health`
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        service: "chatrelay",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.producer.provider_name().to_string(),
        store: state.store.name().to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}
