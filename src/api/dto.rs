//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! Request fields are camelCase; stored rows are returned as stored.
//!
//! Required request fields deserialize with defaults and are checked by the
//! handlers, so a missing field is a 400 with a useful message rather than
//! a deserializer rejection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Property, PropertyValue, SchedulingRequest, WaitlistEntry};

// ============================================
// WAITLIST DTOs
// ============================================

/// Waitlist signup request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// "landlord", "tenant", ...
    #[serde(default)]
    pub user_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WaitlistCreatedResponse {
    pub success: bool,
    pub entry: WaitlistEntry,
}

#[derive(Debug, Serialize)]
pub struct WaitlistListResponse {
    pub entries: Vec<WaitlistEntry>,
    pub count: usize,
}

// ============================================
// SCHEDULING DTOs
// ============================================

/// Scheduling request submission
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingRequestBody {
    #[serde(default)]
    pub property_id: String,
    #[serde(default)]
    pub service_type: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Email addresses or phone numbers
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub preferred_dates: Vec<String>,
    #[serde(default)]
    pub preferred_time_slots: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingCreatedResponse {
    pub success: bool,
    pub message: String,
    pub request_id: String,
}

/// Query parameters for scheduling lookups
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingParams {
    pub request_id: Option<String>,
    pub property_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingRequestResponse {
    pub scheduling_request: SchedulingRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingListResponse {
    pub scheduling_requests: Vec<SchedulingRequest>,
}

// ============================================
// PROPERTY VALUE DTOs
// ============================================

/// `?propertyId=` query parameter
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyParams {
    pub property_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PropertyValuesResponse {
    pub property: Property,
    pub values: Vec<PropertyValue>,
}

/// Record a property value, manual or looked up
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertValueRequest {
    #[serde(default)]
    pub property_id: String,
    #[serde(default)]
    pub use_zillow: bool,
    /// Number or numeric string
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertValueResponse {
    pub success: bool,
    pub property_value: PropertyValue,
    pub source: String,
    pub confidence: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentEstimateResponse {
    pub property_id: String,
    pub rent: f64,
    pub confidence: f64,
    pub source: String,
    pub last_updated: DateTime<Utc>,
}

// ============================================
// VALUATION DTOs
// ============================================

/// Address to value, as entered on the property form
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,
    /// "ok" or "error"
    pub datastore: String,
    /// Backend name
    pub backend: String,
    /// "zillow" or "mock"
    pub valuation: String,
    pub uptime_seconds: u64,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduling_body_defaults() {
        let body: SchedulingRequestBody =
            serde_json::from_str(r#"{"propertyId": "p1", "serviceType": "repair"}"#).unwrap();

        assert_eq!(body.property_id, "p1");
        assert!(body.participants.is_empty());
        assert!(body.preferred_time_slots.is_empty());
        assert_eq!(body.priority, None);
    }

    #[test]
    fn test_upsert_value_accepts_string_or_number() {
        let body: UpsertValueRequest =
            serde_json::from_str(r#"{"propertyId": "p1", "value": "425000"}"#).unwrap();
        assert!(!body.use_zillow);
        assert_eq!(body.value, Some(serde_json::json!("425000")));

        let body: UpsertValueRequest =
            serde_json::from_str(r#"{"propertyId": "p1", "value": 425000}"#).unwrap();
        assert_eq!(body.value, Some(serde_json::json!(425000)));
    }
}
