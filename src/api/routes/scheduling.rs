//! Scheduling Routes
//!
//! Persists property-service scheduling requests. Nothing here contacts the
//! participants; a request is stored as `pending` and read back.
//!
//! - POST /api/scheduling - Create a request
//! - GET /api/scheduling?requestId= - One request
//! - GET /api/scheduling?propertyId= - Requests for a property

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{
    SchedulingCreatedResponse, SchedulingListResponse, SchedulingParams, SchedulingRequestBody,
    SchedulingRequestResponse,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::store::{NewSchedulingRequest, Priority, ServiceType};

const MAX_PARTICIPANTS: usize = 50;

/// POST /api/scheduling
pub async fn create_scheduling_request(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SchedulingRequestBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SchedulingCreatedResponse>)> {
    let Json(body) = payload?;
    let request = validate_scheduling_request(body)?;

    let created = state.store.insert_scheduling_request(request).await?;

    tracing::info!(
        request_id = %created.id,
        property_id = %created.property_id,
        service_type = %created.service_type,
        priority = %created.priority,
        participants = created.participants.len(),
        "Scheduling request created"
    );

    Ok((
        StatusCode::CREATED,
        Json(SchedulingCreatedResponse {
            success: true,
            message: "Scheduling request created successfully".to_string(),
            request_id: created.id,
        }),
    ))
}

/// GET /api/scheduling
///
/// `requestId` wins when both parameters are given.
pub async fn get_scheduling_requests(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SchedulingParams>,
) -> ApiResult<Response> {
    if let Some(id) = non_empty(params.request_id.as_deref()) {
        let scheduling_request = state
            .store
            .get_scheduling_request(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Scheduling request not found".to_string()))?;

        return Ok(Json(SchedulingRequestResponse { scheduling_request }).into_response());
    }

    if let Some(property_id) = non_empty(params.property_id.as_deref()) {
        let scheduling_requests = state.store.list_scheduling_requests(property_id).await?;
        return Ok(Json(SchedulingListResponse {
            scheduling_requests,
        })
        .into_response());
    }

    Err(ApiError::Validation(
        "requestId or propertyId parameter is required".to_string(),
    ))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Validate a submission and turn it into an insert payload
fn validate_scheduling_request(body: SchedulingRequestBody) -> ApiResult<NewSchedulingRequest> {
    let property_id = body.property_id.trim();
    if property_id.is_empty() {
        return Err(ApiError::Validation("propertyId is required".to_string()));
    }

    if body.service_type.trim().is_empty() {
        return Err(ApiError::Validation("serviceType is required".to_string()));
    }
    let service_type: ServiceType = body.service_type.parse().map_err(ApiError::Validation)?;

    let priority = match non_empty(body.priority.as_deref()) {
        Some(p) => p.parse::<Priority>().map_err(ApiError::Validation)?,
        None => Priority::default(),
    };

    let participants: Vec<String> = body
        .participants
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    if participants.is_empty() {
        return Err(ApiError::Validation(
            "At least one participant is required".to_string(),
        ));
    }
    if participants.len() > MAX_PARTICIPANTS {
        return Err(ApiError::Validation(format!(
            "Too many participants (maximum {})",
            MAX_PARTICIPANTS
        )));
    }

    Ok(NewSchedulingRequest {
        property_id: property_id.to_string(),
        service_type,
        priority,
        description: body.description.unwrap_or_default().trim().to_string(),
        participants,
        preferred_dates: body.preferred_dates,
        preferred_time_slots: body.preferred_time_slots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> SchedulingRequestBody {
        SchedulingRequestBody {
            property_id: "p1".to_string(),
            service_type: "repair".to_string(),
            participants: vec!["tenant@example.com".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_priority_to_medium() {
        let request = validate_scheduling_request(body()).unwrap();
        assert_eq!(request.priority, Priority::Medium);
        assert_eq!(request.service_type, ServiceType::Repair);
        assert_eq!(request.description, "");
    }

    #[test]
    fn test_rejects_empty_participants() {
        let mut b = body();
        b.participants = vec!["  ".to_string()];
        assert!(matches!(
            validate_scheduling_request(b),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_service_and_priority() {
        let mut b = body();
        b.service_type = "gardening".to_string();
        assert!(validate_scheduling_request(b).is_err());

        let mut b = body();
        b.priority = Some("whenever".to_string());
        assert!(validate_scheduling_request(b).is_err());

        let mut b = body();
        b.property_id = String::new();
        assert!(validate_scheduling_request(b).is_err());
    }
}
