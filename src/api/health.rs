// src/api/health.rs

use axum::{response::IntoResponse, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub transport: &'static str,
    /// Seconds since startup.
    pub uptime: u64,
    pub modern_sessions: usize,
    pub legacy_sessions: usize,
    pub total_sessions: usize,
}

impl HealthStatus {
    pub fn collect(state: &AppState) -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            transport: state.config.transport.as_str(),
            uptime: state.started_at.elapsed().as_secs(),
            modern_sessions: state.sessions.modern_count(),
            legacy_sessions: state.sessions.legacy_count(),
            total_sessions: state.sessions.total(),
        }
    }
}

/// Read-only; never touches the registries.
pub async fn health_handler(state: AppState) -> impl IntoResponse {
    Json(HealthStatus::collect(&state))
}
