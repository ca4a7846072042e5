//! Zillow REST API Client
//!
//! HTTP client for property value (Zestimate) and rent estimate lookups.
//! A lookup that finds nothing, or a client without an API key, yields
//! `Ok(None)` so callers can fall back to the mock generator.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::{AddressQuery, PropertyEstimate, RentEstimate, ValuationError};

/// Configuration for the Zillow client
#[derive(Debug, Clone)]
pub struct ZillowConfig {
    /// API key; lookups are skipped when unset
    pub api_key: Option<String>,
    /// Base URL for the provider API
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ZillowConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.bridgedataoutput.com/api/v2".to_string(),
            request_timeout_ms: 5000,
        }
    }
}

/// One property in a provider search result
#[derive(Debug, Clone, Deserialize)]
pub struct ZillowProperty {
    pub zpid: String,
    pub zestimate: Zestimate,
    #[serde(rename = "rentZestimate", default)]
    pub rent_zestimate: Option<Zestimate>,
}

/// Provider estimate with its confidence band
#[derive(Debug, Clone, Deserialize)]
pub struct Zestimate {
    pub amount: f64,
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
    #[serde(rename = "valueLow")]
    pub value_low: f64,
    #[serde(rename = "valueHigh")]
    pub value_high: f64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    properties: Vec<ZillowProperty>,
}

/// Zillow REST API client
pub struct ZillowClient {
    client: Client,
    config: ZillowConfig,
}

impl ZillowClient {
    /// Create a new client with the given configuration
    pub fn new(config: ZillowConfig) -> Result<Self, ValuationError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(ValuationError::Request)?;

        Ok(Self { client, config })
    }

    /// Whether an API key is configured
    pub fn is_configured(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .map(|k| !k.is_empty())
            .unwrap_or(false)
    }

    /// Search for a property by address, returning the first match
    pub async fn search_property(
        &self,
        query: &AddressQuery,
    ) -> Result<Option<ZillowProperty>, ValuationError> {
        let api_key = match self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => key,
            None => {
                tracing::warn!("Zillow API key not configured");
                return Ok(None);
            }
        };

        let url = format!("{}/properties", self.config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .bearer_auth(api_key)
            .query(&[
                ("address", query.address.as_str()),
                ("city", query.city.as_str()),
                ("state", query.state.as_str()),
                ("zipcode", query.zip_code.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ValuationError::Timeout
                } else {
                    ValuationError::Request(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ValuationError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        let result: SearchResponse = response.json().await.map_err(ValuationError::Request)?;
        Ok(result.properties.into_iter().next())
    }

    /// Zestimate for an address
    pub async fn property_value(
        &self,
        query: &AddressQuery,
    ) -> Result<Option<PropertyEstimate>, ValuationError> {
        let Some(property) = self.search_property(query).await? else {
            return Ok(None);
        };

        Ok(Some(PropertyEstimate {
            value: property.zestimate.amount,
            confidence: calculate_confidence(&property.zestimate),
            source: "zillow".to_string(),
            last_updated: property.zestimate.last_updated,
        }))
    }

    /// Rent Zestimate for an address
    pub async fn rental_estimate(
        &self,
        query: &AddressQuery,
    ) -> Result<Option<RentEstimate>, ValuationError> {
        let Some(rent) = self
            .search_property(query)
            .await?
            .and_then(|p| p.rent_zestimate)
        else {
            return Ok(None);
        };

        Ok(Some(RentEstimate {
            rent: rent.amount,
            confidence: calculate_confidence(&rent),
            source: "zillow_rent".to_string(),
            last_updated: rent.last_updated,
        }))
    }
}

/// Confidence from the width of the estimate band relative to the estimate
///
/// Narrower band, higher confidence: <=5% → 0.95 down to >25% → 0.45.
pub fn calculate_confidence(estimate: &Zestimate) -> f64 {
    if estimate.amount <= 0.0 {
        return 0.45;
    }

    let range = estimate.value_high - estimate.value_low;
    let percentage = (range / estimate.amount) * 100.0;

    match percentage {
        p if p <= 5.0 => 0.95,
        p if p <= 10.0 => 0.85,
        p if p <= 15.0 => 0.75,
        p if p <= 20.0 => 0.65,
        p if p <= 25.0 => 0.55,
        _ => 0.45,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zestimate(amount: f64, low: f64, high: f64) -> Zestimate {
        Zestimate {
            amount,
            last_updated: Utc::now(),
            value_low: low,
            value_high: high,
        }
    }

    #[test]
    fn test_confidence_tiers() {
        assert_eq!(calculate_confidence(&zestimate(100.0, 98.0, 103.0)), 0.95);
        assert_eq!(calculate_confidence(&zestimate(100.0, 95.0, 105.0)), 0.85);
        assert_eq!(calculate_confidence(&zestimate(100.0, 93.0, 107.0)), 0.75);
        assert_eq!(calculate_confidence(&zestimate(100.0, 90.0, 110.0)), 0.65);
        assert_eq!(calculate_confidence(&zestimate(100.0, 88.0, 112.0)), 0.55);
        assert_eq!(calculate_confidence(&zestimate(100.0, 50.0, 150.0)), 0.45);
    }

    #[test]
    fn test_confidence_zero_amount() {
        assert_eq!(calculate_confidence(&zestimate(0.0, 0.0, 0.0)), 0.45);
    }

    #[test]
    fn test_search_response_parse() {
        let json = r#"{
            "properties": [{
                "zpid": "123",
                "zestimate": {
                    "amount": 450000,
                    "lastUpdated": "2024-01-15T00:00:00Z",
                    "valueLow": 430000,
                    "valueHigh": 470000
                }
            }]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.properties.len(), 1);
        assert_eq!(parsed.properties[0].zestimate.amount, 450_000.0);
        assert!(parsed.properties[0].rent_zestimate.is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_client_returns_none() {
        let client = ZillowClient::new(ZillowConfig::default()).unwrap();
        assert!(!client.is_configured());

        let query = AddressQuery {
            address: "1 Elm St".to_string(),
            city: "Austin".to_string(),
            state: "TX".to_string(),
            zip_code: "78701".to_string(),
        };
        assert!(client.property_value(&query).await.unwrap().is_none());
    }
}
