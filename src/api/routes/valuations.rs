//! Valuation Route
//!
//! - POST /api/valuations/estimate - Value an address before it is saved

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::EstimateRequest;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::valuation::{AddressQuery, PropertyEstimate};

/// POST /api/valuations/estimate
///
/// Backs the property form's "fetch value" action; all four address fields
/// are required.
pub async fn estimate_value(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EstimateRequest>, JsonRejection>,
) -> ApiResult<Json<PropertyEstimate>> {
    let Json(req) = payload?;
    let query = validate_estimate_request(req)?;

    let estimate = state.valuation.estimate_value(&query).await?;
    Ok(Json(estimate))
}

fn validate_estimate_request(req: EstimateRequest) -> ApiResult<AddressQuery> {
    let fields = [
        ("address", &req.address),
        ("city", &req.city),
        ("state", &req.state),
        ("zipCode", &req.zip_code),
    ];
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if !missing.is_empty() {
        return Err(ApiError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    Ok(AddressQuery {
        address: req.address.trim().to_string(),
        city: req.city.trim().to_string(),
        state: req.state.trim().to_string(),
        zip_code: req.zip_code.trim().to_string(),
    })
}
