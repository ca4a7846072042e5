//! Property Value Routes
//!
//! All routes require a bearer token and only touch the caller's properties.
//!
//! - GET /api/properties/values?propertyId= - Value history
//! - POST /api/properties/values - Record today's value (manual or looked up)
//! - GET /api/properties/rent-estimate?propertyId= - Monthly rent estimate

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::api::dto::{
    PropertyParams, PropertyValuesResponse, RentEstimateResponse, UpsertValueRequest,
    UpsertValueResponse,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::store::{AuthUser, NewPropertyValue, Property, ValueType};
use crate::valuation::AddressQuery;

const DEFAULT_MANUAL_SOURCE: &str = "landlord";

/// GET /api/properties/values
pub async fn get_property_values(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<PropertyParams>,
) -> ApiResult<Json<PropertyValuesResponse>> {
    let property_id = required_property_id(params.property_id.as_deref())?;
    let property = owned_property(&state, property_id, &user).await?;
    let values = state.store.list_property_values(&property.id).await?;

    Ok(Json(PropertyValuesResponse { property, values }))
}

/// POST /api/properties/values
///
/// Manual values carry full confidence. Looked-up values come from the
/// provider, or from the mock generator when it has nothing. Either way one
/// row per property, value type and day is kept.
pub async fn upsert_property_value(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<UpsertValueRequest>, JsonRejection>,
) -> ApiResult<Json<UpsertValueResponse>> {
    let Json(req) = payload?;
    let property_id = required_property_id(Some(req.property_id.as_str()))?;
    let property = owned_property(&state, property_id, &user).await?;

    let (value_type, amount, source, confidence) = if req.use_zillow {
        let estimate = state
            .valuation
            .estimate_value(&AddressQuery::from(&property))
            .await?;
        (
            ValueType::Zillow,
            estimate.value,
            estimate.source,
            estimate.confidence,
        )
    } else {
        let amount = parse_manual_value(req.value.as_ref())?;
        let source = req
            .source
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_MANUAL_SOURCE.to_string());
        (ValueType::Manual, amount, source, 1.0)
    };

    let stored = state
        .store
        .upsert_property_value(NewPropertyValue {
            property_id: property.id.clone(),
            value_type,
            value_amount: amount,
            value_date: Utc::now().date_naive(),
            source: source.clone(),
            confidence_score: confidence,
        })
        .await?;

    tracing::info!(
        property_id = %property.id,
        value_type = %value_type.as_str(),
        value = amount,
        source = %source,
        "Property value recorded"
    );

    Ok(Json(UpsertValueResponse {
        success: true,
        property_value: stored,
        source,
        confidence,
    }))
}

/// GET /api/properties/rent-estimate
pub async fn get_rent_estimate(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<PropertyParams>,
) -> ApiResult<Json<RentEstimateResponse>> {
    let property_id = required_property_id(params.property_id.as_deref())?;
    let property = owned_property(&state, property_id, &user).await?;

    let estimate = state
        .valuation
        .estimate_rent(&AddressQuery::from(&property))
        .await?;

    Ok(Json(RentEstimateResponse {
        property_id: property.id,
        rent: estimate.rent,
        confidence: estimate.confidence,
        source: estimate.source,
        last_updated: estimate.last_updated,
    }))
}

fn required_property_id(value: Option<&str>) -> ApiResult<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Validation("Property ID is required".to_string()))
}

/// Load a property, treating someone else's property as missing
async fn owned_property(state: &AppState, property_id: &str, user: &AuthUser) -> ApiResult<Property> {
    state
        .store
        .find_property(property_id, &user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Property not found".to_string()))
}

/// A manual value: a positive number, sent as a number or a numeric string
fn parse_manual_value(value: Option<&serde_json::Value>) -> ApiResult<f64> {
    let amount = match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => None,
        Some(serde_json::Value::String(s)) => Some(s.trim().parse::<f64>().map_err(|_| {
            ApiError::Validation(format!("Property value is not a number: {}", s))
        })?),
        Some(other) => {
            return Err(ApiError::Validation(format!(
                "Property value must be a number, got {}",
                other
            )))
        }
    };

    match amount {
        None => Err(ApiError::Validation("Property value is required".to_string())),
        Some(v) if !v.is_finite() || v <= 0.0 => Err(ApiError::Validation(
            "Property value must be greater than zero".to_string(),
        )),
        Some(v) => Ok(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_manual_value() {
        assert_eq!(parse_manual_value(Some(&json!(425000))).unwrap(), 425_000.0);
        assert_eq!(parse_manual_value(Some(&json!(" 425000.5 "))).unwrap(), 425_000.5);

        assert!(parse_manual_value(None).is_err());
        assert!(parse_manual_value(Some(&json!(null))).is_err());
        assert!(parse_manual_value(Some(&json!(""))).is_err());
        assert!(parse_manual_value(Some(&json!(0))).is_err());
        assert!(parse_manual_value(Some(&json!(-5))).is_err());
        assert!(parse_manual_value(Some(&json!("lots"))).is_err());
        assert!(parse_manual_value(Some(&json!([1]))).is_err());
    }

    #[test]
    fn test_required_property_id() {
        assert_eq!(required_property_id(Some(" p1 ")).unwrap(), "p1");
        assert!(required_property_id(Some("")).is_err());
        assert!(required_property_id(None).is_err());
    }
}
