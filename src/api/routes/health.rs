//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (ready to serve traffic)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Kubernetes readiness probe.
/// Returns 200 once the datastore answers a round trip.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    match check_datastore_health(&state).await {
        true => StatusCode::OK,
        false => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// GET /health
///
/// Full health status with component details.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let datastore_ok = check_datastore_health(&state).await;

    let valuation = if state.valuation.provider_configured() {
        "zillow"
    } else {
        "mock"
    };

    Json(HealthResponse {
        status: if datastore_ok { "healthy" } else { "degraded" }.to_string(),
        datastore: if datastore_ok { "ok" } else { "error" }.to_string(),
        backend: state.store.backend().to_string(),
        valuation: valuation.to_string(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn check_datastore_health(state: &AppState) -> bool {
    match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(backend = state.store.backend(), error = %e, "Datastore health check failed");
            false
        }
    }
}
