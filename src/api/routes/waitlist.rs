//! Waitlist Routes
//!
//! - POST /api/waitlist - Join the waitlist
//! - GET /api/waitlist - List entries, newest first
//! - GET /api/waitlist/export - Entries as CSV

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use std::io::Write;
use std::sync::Arc;

use crate::api::dto::{WaitlistCreatedResponse, WaitlistListResponse, WaitlistRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::store::{NewWaitlistEntry, StoreError, WaitlistEntry};

const MAX_NAME_LEN: usize = 200;
const MAX_EMAIL_LEN: usize = 254;

/// POST /api/waitlist
///
/// Admit a new email: duplicate check, then insert. The datastore's unique
/// index on the email catches a concurrent duplicate that slips past the
/// check, and both paths answer 409.
pub async fn join_waitlist(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<WaitlistRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<WaitlistCreatedResponse>)> {
    let Json(req) = payload?;
    let entry = validate_waitlist_request(req)?;

    if state.store.find_waitlist_entry(&entry.email).await?.is_some() {
        return Err(duplicate(&entry.email));
    }

    let entry = match state.store.insert_waitlist_entry(entry).await {
        Ok(entry) => entry,
        Err(StoreError::Duplicate(_)) => {
            tracing::info!("Concurrent waitlist signup rejected by unique index");
            return Err(ApiError::Conflict("Email already on waitlist".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(entry_id = %entry.id, "Waitlist entry created");

    Ok((
        StatusCode::CREATED,
        Json(WaitlistCreatedResponse {
            success: true,
            entry,
        }),
    ))
}

/// GET /api/waitlist
pub async fn list_waitlist(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<WaitlistListResponse>> {
    let entries = state.store.list_waitlist().await?;

    Ok(Json(WaitlistListResponse {
        count: entries.len(),
        entries,
    }))
}

/// GET /api/waitlist/export
///
/// Download every entry as `Name,Email,Date`.
pub async fn export_waitlist(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let entries = state.store.list_waitlist().await?;

    let mut body = Vec::new();
    write_waitlist_csv(&entries, &mut body)
        .map_err(|e| ApiError::Internal(format!("CSV export failed: {}", e)))?;

    let disposition = format!(
        "attachment; filename=\"waitlist-{}.csv\"",
        Utc::now().format("%Y-%m-%d")
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, disposition.as_str()),
        ],
        Body::from(body),
    )
        .into_response())
}

/// Write entries as CSV with a `Name,Email,Date` header
pub fn write_waitlist_csv<W: Write>(entries: &[WaitlistEntry], writer: W) -> csv::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["Name", "Email", "Date"])?;

    for entry in entries {
        let date = entry.created_at.format("%Y-%m-%d").to_string();
        csv.write_record([entry.name.as_str(), entry.email.as_str(), date.as_str()])?;
    }

    csv.flush()?;
    Ok(())
}

/// Validate a signup and normalise it into an insert payload
fn validate_waitlist_request(req: WaitlistRequest) -> ApiResult<NewWaitlistEntry> {
    let name = req.name.trim();
    let email = req.email.trim().to_lowercase();

    if name.is_empty() {
        return Err(ApiError::Validation("Name is required".to_string()));
    }
    if email.is_empty() {
        return Err(ApiError::Validation("Email is required".to_string()));
    }
    if !email.contains('@') {
        return Err(ApiError::Validation("Email address is invalid".to_string()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ApiError::Validation(format!(
            "Name exceeds maximum length of {} characters",
            MAX_NAME_LEN
        )));
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(ApiError::Validation(format!(
            "Email exceeds maximum length of {} characters",
            MAX_EMAIL_LEN
        )));
    }

    let user_type = req
        .user_type
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    Ok(NewWaitlistEntry {
        name: name.to_string(),
        email,
        user_type,
    })
}

fn duplicate(email: &str) -> ApiError {
    tracing::info!(email = %email, "Duplicate waitlist signup");
    ApiError::Conflict("Email already on waitlist".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str) -> WaitlistRequest {
        WaitlistRequest {
            name: name.to_string(),
            email: email.to_string(),
            user_type: None,
        }
    }

    #[test]
    fn test_validation_normalises_email() {
        let entry = validate_waitlist_request(request(" Ada ", "  Ada@Example.COM ")).unwrap();
        assert_eq!(entry.name, "Ada");
        assert_eq!(entry.email, "ada@example.com");
    }

    #[test]
    fn test_validation_rejects_bad_input() {
        assert!(validate_waitlist_request(request("", "a@b.c")).is_err());
        assert!(validate_waitlist_request(request("Ada", "   ")).is_err());
        assert!(validate_waitlist_request(request("Ada", "not-an-email")).is_err());
        assert!(validate_waitlist_request(request(&"x".repeat(201), "a@b.c")).is_err());
    }

    #[test]
    fn test_blank_user_type_dropped() {
        let mut req = request("Ada", "a@b.c");
        req.user_type = Some("  ".to_string());
        assert_eq!(validate_waitlist_request(req).unwrap().user_type, None);
    }

    #[test]
    fn test_csv_shape() {
        let entries = vec![
            NewWaitlistEntry {
                name: "Ada, Countess".to_string(),
                email: "ada@example.com".to_string(),
                user_type: None,
            }
            .into_entry(),
        ];

        let mut out = Vec::new();
        write_waitlist_csv(&entries, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Name,Email,Date");
        assert!(lines[1].starts_with("\"Ada, Countess\",ada@example.com,"));
        assert_eq!(lines.len(), 2);
    }
}
