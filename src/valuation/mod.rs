//! Property Valuation
//!
//! Estimates a property's market value and monthly rent:
//! - **zillow**: provider lookup, used when an API key is configured
//! - **mock**: deterministic hash-based stand-in for development
//!
//! [`ValuationService`] tries the provider first and falls back to the mock
//! generator when the provider has nothing (and fallback is enabled).

pub mod mock;
pub mod zillow;

pub use mock::{address_hash, mock_property_value, mock_rental_estimate};
pub use zillow::{calculate_confidence, ZillowClient, ZillowConfig};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::store::Property;

/// A property value estimate
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyEstimate {
    pub value: f64,
    /// 0.0 - 1.0
    pub confidence: f64,
    pub source: String,
    pub last_updated: DateTime<Utc>,
}

/// A monthly rent estimate
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RentEstimate {
    pub rent: f64,
    pub confidence: f64,
    pub source: String,
    pub last_updated: DateTime<Utc>,
}

/// Address fields a valuation lookup needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressQuery {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl AddressQuery {
    /// Single-line form, also the mock generator's hash input
    pub fn one_line(&self) -> String {
        format!(
            "{}, {}, {} {}",
            self.address, self.city, self.state, self.zip_code
        )
    }
}

impl From<&Property> for AddressQuery {
    fn from(property: &Property) -> Self {
        Self {
            address: property.address.clone(),
            city: property.city.clone(),
            state: property.state.clone(),
            zip_code: property.zip_code.clone(),
        }
    }
}

/// Errors from the valuation provider
#[derive(Debug, Error)]
pub enum ValuationError {
    #[error("Valuation request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Valuation API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Valuation request timed out")]
    Timeout,

    #[error("No valuation available for {0}")]
    Unavailable(String),
}

/// Provider lookup with mock fallback
pub struct ValuationService {
    zillow: ZillowClient,
    mock_fallback: bool,
}

impl ValuationService {
    pub fn new(zillow: ZillowClient, mock_fallback: bool) -> Self {
        Self {
            zillow,
            mock_fallback,
        }
    }

    /// Service with no provider key: every estimate comes from the mock
    pub fn mock_only() -> Result<Self, ValuationError> {
        Ok(Self::new(ZillowClient::new(ZillowConfig::default())?, true))
    }

    pub fn provider_configured(&self) -> bool {
        self.zillow.is_configured()
    }

    /// Market value for an address
    pub async fn estimate_value(
        &self,
        query: &AddressQuery,
    ) -> Result<PropertyEstimate, ValuationError> {
        match self.zillow.property_value(query).await {
            Ok(Some(estimate)) => return Ok(estimate),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(address = %query.one_line(), error = %e, "Zillow value lookup failed");
            }
        }

        if !self.mock_fallback {
            return Err(ValuationError::Unavailable(query.one_line()));
        }

        // The mock keys on the street line alone
        tracing::debug!(address = %query.address, "Using mock property value");
        Ok(mock_property_value(&query.address, &mut rand::thread_rng()))
    }

    /// Monthly rent for an address
    pub async fn estimate_rent(&self, query: &AddressQuery) -> Result<RentEstimate, ValuationError> {
        match self.zillow.rental_estimate(query).await {
            Ok(Some(estimate)) => return Ok(estimate),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(address = %query.one_line(), error = %e, "Zillow rent lookup failed");
            }
        }

        if !self.mock_fallback {
            return Err(ValuationError::Unavailable(query.one_line()));
        }

        tracing::debug!(address = %query.address, "Using mock rent estimate");
        Ok(mock_rental_estimate(&query.address, &mut rand::thread_rng()))
    }
}
