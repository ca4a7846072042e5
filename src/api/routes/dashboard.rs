//! Dashboard Route
//!
//! - GET /api/dashboard - Portfolio rows, recent tasks and metrics for the caller

use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::dashboard::{build_dashboard, DashboardResponse, DASHBOARD_TASK_LIMIT};
use crate::store::AuthUser;

/// GET /api/dashboard
///
/// Requires a bearer token; the caller's id is the landlord id.
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<DashboardResponse>> {
    let portfolio = state.store.landlord_portfolio(&user.user_id).await?;
    let tasks = state
        .store
        .recent_tasks(&user.user_id, DASHBOARD_TASK_LIMIT)
        .await?;

    let dashboard = build_dashboard(&portfolio, tasks, Utc::now().date_naive());

    tracing::debug!(
        landlord_id = %user.user_id,
        properties = dashboard.properties.len(),
        tasks = dashboard.tasks.len(),
        "Dashboard aggregated"
    );

    Ok(Json(dashboard))
}
