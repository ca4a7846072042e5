//! Page Routes
//!
//! - GET / - Landing page
//! - GET /waitlist - Signup form
//! - GET /admin/waitlist - Signups table with CSV export link
//! - GET /scheduling - Scheduling request form
//! - GET /demo - Dashboard over the built-in demo portfolio

use axum::{extract::State, response::Html};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::dashboard::demo_dashboard;
use crate::pages;

/// GET /
pub async fn landing() -> Html<String> {
    Html(pages::landing_page())
}

/// GET /waitlist
pub async fn waitlist_form() -> Html<String> {
    Html(pages::waitlist_page())
}

/// GET /admin/waitlist
pub async fn admin_waitlist(State(state): State<Arc<AppState>>) -> ApiResult<Html<String>> {
    let entries = state.store.list_waitlist().await?;
    Ok(Html(pages::admin_waitlist_page(&entries)))
}

/// GET /scheduling
pub async fn scheduling_form() -> Html<String> {
    Html(pages::scheduling_page())
}

/// GET /demo
pub async fn demo() -> Html<String> {
    Html(pages::demo_page(&demo_dashboard()))
}
