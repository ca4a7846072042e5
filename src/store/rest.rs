//! Hosted Datastore - PostgREST-style REST backend
//!
//! Talks to a managed Postgres service that exposes tables under
//! `/rest/v1/<table>` and token introspection under `/auth/v1/user`.
//! Filters use the `column=op.value` query syntax; writes ask for the
//! stored row back with `Prefer: return=representation`.

use crate::store::error::{StoreError, StoreResult};
use crate::store::types::*;
use crate::store::Datastore;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;

/// Configuration for the hosted datastore
#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    /// Project URL (e.g., "https://abc.supabase.co")
    pub base_url: String,
    /// Service key sent as `apikey` and bearer token
    pub api_key: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for RestStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            request_timeout_ms: 10_000,
        }
    }
}

/// Datastore client for a hosted PostgREST service
pub struct RestStore {
    client: Client,
    config: RestStoreConfig,
}

impl RestStore {
    /// Create a new client with the given configuration
    pub fn new(config: RestStoreConfig) -> StoreResult<Self> {
        if config.base_url.is_empty() {
            return Err(StoreError::Config(
                "hosted datastore URL is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            table
        )
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    /// SELECT rows from a table
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> StoreResult<Vec<T>> {
        let response = self
            .authorized(self.client.get(self.table_url(table)))
            .query(&[("select", "*")])
            .query(query)
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// INSERT (or upsert, depending on `prefer`) one row and return it as stored
    async fn write<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
        prefer: &str,
        body: &B,
    ) -> StoreResult<T> {
        let response = self
            .authorized(self.client.post(self.table_url(table)))
            .header("Prefer", prefer)
            .query(query)
            .json(&[body])
            .send()
            .await?;

        let response = check_status(response).await?;
        let mut rows: Vec<T> = response.json().await?;
        if rows.is_empty() {
            return Err(StoreError::Remote {
                status: StatusCode::OK.as_u16(),
                message: format!("write to {} returned no row", table),
            });
        }
        Ok(rows.swap_remove(0))
    }
}

/// Turn a non-2xx response into a `StoreError`
async fn check_status(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    if status == StatusCode::CONFLICT {
        return Err(StoreError::Duplicate(message));
    }

    Err(StoreError::Remote {
        status: status.as_u16(),
        message,
    })
}

/// `eq.<value>` filter
fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

/// `in.(a,b,c)` filter; values are quoted so commas inside ids stay safe
fn in_list<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    let quoted: Vec<String> = values
        .into_iter()
        .map(|v| format!("\"{}\"", v.replace('"', "\\\"")))
        .collect();
    format!("in.({})", quoted.join(","))
}

/// Split child rows by `property_id`, keeping their fetched order
fn group_by_property<T>(
    rows: Vec<T>,
    property_id: impl Fn(&T) -> &str,
) -> HashMap<String, Vec<T>> {
    let mut grouped: HashMap<String, Vec<T>> = HashMap::new();
    for row in rows {
        grouped
            .entry(property_id(&row).to_string())
            .or_default()
            .push(row);
    }
    grouped
}

/// Attach child rows to their properties, dropping properties with no value
/// row (the dashboard is an inner join on values)
fn assemble_portfolio(
    properties: Vec<Property>,
    values: Vec<PropertyValue>,
    tenants: Vec<Tenant>,
    payments: Vec<Payment>,
) -> Vec<PropertyRecord> {
    let mut values = group_by_property(values, |v| v.property_id.as_str());
    let mut tenants = group_by_property(tenants, |t| t.property_id.as_str());
    let mut payments = group_by_property(payments, |p| p.property_id.as_str());

    properties
        .into_iter()
        .filter_map(|property| {
            let values = values.remove(&property.id)?;
            Some(PropertyRecord {
                values,
                tenants: tenants.remove(&property.id).unwrap_or_default(),
                payments: payments.remove(&property.id).unwrap_or_default(),
                property,
            })
        })
        .collect()
}

#[async_trait]
impl Datastore for RestStore {
    fn backend(&self) -> &'static str {
        "rest"
    }

    async fn ping(&self) -> StoreResult<()> {
        let _: Vec<serde_json::Value> = self
            .select("waitlist", &[("limit", "1".to_string())])
            .await?;
        Ok(())
    }

    async fn find_waitlist_entry(&self, email: &str) -> StoreResult<Option<WaitlistEntry>> {
        let mut rows: Vec<WaitlistEntry> = self
            .select(
                "waitlist",
                &[("email", eq(email)), ("limit", "1".to_string())],
            )
            .await?;
        Ok(rows.pop())
    }

    async fn insert_waitlist_entry(&self, entry: NewWaitlistEntry) -> StoreResult<WaitlistEntry> {
        let entry = entry.into_entry();
        self.write("waitlist", &[], "return=representation", &entry)
            .await
    }

    async fn list_waitlist(&self) -> StoreResult<Vec<WaitlistEntry>> {
        self.select("waitlist", &[("order", "created_at.desc".to_string())])
            .await
    }

    async fn insert_scheduling_request(
        &self,
        request: NewSchedulingRequest,
    ) -> StoreResult<SchedulingRequest> {
        let request = request.into_request();
        self.write("scheduling_requests", &[], "return=representation", &request)
            .await
    }

    async fn get_scheduling_request(&self, id: &str) -> StoreResult<Option<SchedulingRequest>> {
        let mut rows: Vec<SchedulingRequest> = self
            .select(
                "scheduling_requests",
                &[("id", eq(id)), ("limit", "1".to_string())],
            )
            .await?;
        Ok(rows.pop())
    }

    async fn list_scheduling_requests(
        &self,
        property_id: &str,
    ) -> StoreResult<Vec<SchedulingRequest>> {
        self.select(
            "scheduling_requests",
            &[
                ("property_id", eq(property_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn resolve_user(&self, token: &str) -> StoreResult<Option<AuthUser>> {
        let url = format!(
            "{}/auth/v1/user",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(None),
            _ => {
                let response = check_status(response).await?;
                Ok(Some(response.json().await?))
            }
        }
    }

    async fn find_property(
        &self,
        property_id: &str,
        landlord_id: &str,
    ) -> StoreResult<Option<Property>> {
        let mut rows: Vec<Property> = self
            .select(
                "properties",
                &[
                    ("id", eq(property_id)),
                    ("landlord_id", eq(landlord_id)),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.pop())
    }

    async fn landlord_portfolio(&self, landlord_id: &str) -> StoreResult<Vec<PropertyRecord>> {
        let properties: Vec<Property> = self
            .select(
                "properties",
                &[
                    ("landlord_id", eq(landlord_id)),
                    ("order", "created_at.desc".to_string()),
                ],
            )
            .await?;

        if properties.is_empty() {
            return Ok(Vec::new());
        }

        let ids = in_list(properties.iter().map(|p| p.id.as_str()));

        let values: Vec<PropertyValue> = self
            .select(
                "property_values",
                &[
                    ("property_id", ids.clone()),
                    ("order", "value_date.desc,created_at.desc".to_string()),
                ],
            )
            .await?;
        let tenants: Vec<Tenant> = self
            .select("tenants", &[("property_id", ids.clone())])
            .await?;
        let payments: Vec<Payment> = self
            .select(
                "payments",
                &[
                    ("property_id", ids),
                    ("order", "due_date.desc".to_string()),
                ],
            )
            .await?;

        Ok(assemble_portfolio(properties, values, tenants, payments))
    }

    async fn recent_tasks(&self, landlord_id: &str, limit: usize) -> StoreResult<Vec<Task>> {
        self.select(
            "tasks",
            &[
                ("landlord_id", eq(landlord_id)),
                ("order", "created_at.desc".to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn list_property_values(&self, property_id: &str) -> StoreResult<Vec<PropertyValue>> {
        self.select(
            "property_values",
            &[
                ("property_id", eq(property_id)),
                ("order", "value_date.desc,created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn upsert_property_value(&self, value: NewPropertyValue) -> StoreResult<PropertyValue> {
        // No id in the payload: the service keeps the existing row id on conflict
        self.write(
            "property_values",
            &[(
                "on_conflict",
                "property_id,value_type,value_date".to_string(),
            )],
            "resolution=merge-duplicates,return=representation",
            &value,
        )
        .await
    }
}
