//! Row types for the Gustavo datastore
//!
//! Every struct here mirrors one table (or one joined read) and serializes
//! with the column names used by the datastore, so the same types decode
//! rows from the embedded SQLite backend and from the hosted REST backend.
//!
//! - `WaitlistEntry`: prospective-customer signup
//! - `SchedulingRequest`: desired property-service appointment
//! - `Property`, `PropertyValue`, `Tenant`, `Payment`, `Task`: portfolio rows
//! - `PropertyRecord`: one property joined with its values, tenants and payments

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ============================================
// WAITLIST
// ============================================

/// A prospective-customer signup record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaitlistEntry {
    pub id: String,
    pub name: String,
    /// Stored trimmed and lower-cased
    pub email: String,
    #[serde(default)]
    pub user_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for the waitlist table
#[derive(Debug, Clone, Serialize)]
pub struct NewWaitlistEntry {
    pub name: String,
    pub email: String,
    pub user_type: Option<String>,
}

impl NewWaitlistEntry {
    /// Materialize the row the datastore will hold
    pub fn into_entry(self) -> WaitlistEntry {
        WaitlistEntry {
            id: new_id(),
            name: self.name,
            email: self.email,
            user_type: self.user_type,
            created_at: Utc::now(),
        }
    }
}

// ============================================
// SCHEDULING
// ============================================

/// Kind of service a scheduling request asks for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Cleaning,
    Repair,
    Inspection,
    Maintenance,
}

impl ServiceType {
    pub const ALL: [ServiceType; 4] = [
        ServiceType::Cleaning,
        ServiceType::Repair,
        ServiceType::Inspection,
        ServiceType::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Cleaning => "cleaning",
            ServiceType::Repair => "repair",
            ServiceType::Inspection => "inspection",
            ServiceType::Maintenance => "maintenance",
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cleaning" => Ok(ServiceType::Cleaning),
            "repair" => Ok(ServiceType::Repair),
            "inspection" => Ok(ServiceType::Inspection),
            "maintenance" => Ok(ServiceType::Maintenance),
            _ => Err(format!(
                "Invalid service type: {}. Use cleaning, repair, inspection, or maintenance",
                s
            )),
        }
    }
}

/// Urgency of a scheduling request
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            _ => Err(format!(
                "Invalid priority: {}. Use low, medium, high, or urgent",
                s
            )),
        }
    }
}

/// Where a scheduling request stands
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingStatus {
    #[default]
    Pending,
    InProgress,
    Scheduled,
    Completed,
    Cancelled,
}

impl SchedulingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulingStatus::Pending => "pending",
            SchedulingStatus::InProgress => "in_progress",
            SchedulingStatus::Scheduled => "scheduled",
            SchedulingStatus::Completed => "completed",
            SchedulingStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for SchedulingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchedulingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SchedulingStatus::Pending),
            "in_progress" => Ok(SchedulingStatus::InProgress),
            "scheduled" => Ok(SchedulingStatus::Scheduled),
            "completed" => Ok(SchedulingStatus::Completed),
            "cancelled" => Ok(SchedulingStatus::Cancelled),
            _ => Err(format!("Invalid scheduling status: {}", s)),
        }
    }
}

/// A user-submitted request for a property-service appointment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulingRequest {
    pub id: String,
    pub property_id: String,
    pub service_type: ServiceType,
    pub priority: Priority,
    #[serde(default)]
    pub description: String,
    /// Email addresses or phone numbers
    pub participants: Vec<String>,
    #[serde(default)]
    pub preferred_dates: Vec<String>,
    /// e.g. "09:00-11:00"
    #[serde(default)]
    pub preferred_time_slots: Vec<String>,
    pub status: SchedulingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for the scheduling_requests table
#[derive(Debug, Clone)]
pub struct NewSchedulingRequest {
    pub property_id: String,
    pub service_type: ServiceType,
    pub priority: Priority,
    pub description: String,
    pub participants: Vec<String>,
    pub preferred_dates: Vec<String>,
    pub preferred_time_slots: Vec<String>,
}

impl NewSchedulingRequest {
    /// Materialize a pending request
    pub fn into_request(self) -> SchedulingRequest {
        let now = Utc::now();
        SchedulingRequest {
            id: new_id(),
            property_id: self.property_id,
            service_type: self.service_type,
            priority: self.priority,
            description: self.description,
            participants: self.participants,
            preferred_dates: self.preferred_dates,
            preferred_time_slots: self.preferred_time_slots,
            status: SchedulingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================
// PORTFOLIO
// ============================================

/// A rental property owned by a landlord
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Property {
    pub id: String,
    pub landlord_id: String,
    pub address: String,
    #[serde(default)]
    pub unit_number: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default = "default_property_type")]
    pub property_type: String,
    #[serde(default)]
    pub bedrooms: Option<i64>,
    #[serde(default)]
    pub bathrooms: Option<f64>,
    #[serde(default)]
    pub square_feet: Option<i64>,
    #[serde(default)]
    pub year_built: Option<i64>,
    pub created_at: DateTime<Utc>,
}

fn default_property_type() -> String {
    "residential".to_string()
}

impl Property {
    /// Create a residential property with a fresh id
    pub fn new(
        landlord_id: impl Into<String>,
        address: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        zip_code: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            landlord_id: landlord_id.into(),
            address: address.into(),
            unit_number: None,
            city: city.into(),
            state: state.into(),
            zip_code: zip_code.into(),
            property_type: default_property_type(),
            bedrooms: None,
            bathrooms: None,
            square_feet: None,
            year_built: None,
            created_at: Utc::now(),
        }
    }

    /// Builder method: set unit number
    pub fn unit(mut self, unit_number: impl Into<String>) -> Self {
        self.unit_number = Some(unit_number.into());
        self
    }

    /// Builder method: set creation time
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Street address with the unit appended when present
    pub fn display_address(&self) -> String {
        match self.unit_number.as_deref().filter(|u| !u.is_empty()) {
            Some(unit) => format!("{} - {}", self.address, unit),
            None => self.address.clone(),
        }
    }
}

/// Origin of a property value row
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Manual,
    Zillow,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Manual => "manual",
            ValueType::Zillow => "zillow",
        }
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(ValueType::Manual),
            "zillow" => Ok(ValueType::Zillow),
            _ => Err(format!("Invalid value type: {}", s)),
        }
    }
}

/// A dated valuation of one property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyValue {
    pub id: String,
    pub property_id: String,
    pub value_type: ValueType,
    pub value_amount: f64,
    pub value_date: NaiveDate,
    pub source: String,
    pub confidence_score: f64,
    pub created_at: DateTime<Utc>,
}

/// Upsert payload for property_values, keyed on (property_id, value_type, value_date)
#[derive(Debug, Clone, Serialize)]
pub struct NewPropertyValue {
    pub property_id: String,
    pub value_type: ValueType,
    pub value_amount: f64,
    pub value_date: NaiveDate,
    pub source: String,
    pub confidence_score: f64,
}

impl NewPropertyValue {
    pub fn into_value(self) -> PropertyValue {
        PropertyValue {
            id: new_id(),
            property_id: self.property_id,
            value_type: self.value_type,
            value_amount: self.value_amount,
            value_date: self.value_date,
            source: self.source,
            confidence_score: self.confidence_score,
            created_at: Utc::now(),
        }
    }
}

/// A tenant renting a property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tenant {
    pub id: String,
    pub property_id: String,
    pub first_name: String,
    pub last_name: String,
    pub monthly_rent: f64,
    pub is_active: bool,
    #[serde(default)]
    pub lease_end_date: Option<NaiveDate>,
}

impl Tenant {
    /// Create an active tenant
    pub fn new(
        property_id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        monthly_rent: f64,
    ) -> Self {
        Self {
            id: new_id(),
            property_id: property_id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            monthly_rent,
            is_active: true,
            lease_end_date: None,
        }
    }

    /// Builder method: mark the tenancy as ended
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// A rent payment (or an outstanding one)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: String,
    pub property_id: String,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    pub due_date: NaiveDate,
    pub amount: f64,
    /// "paid", "pending", "overdue", ...
    pub status: String,
    #[serde(default = "default_payment_type")]
    pub payment_type: String,
}

fn default_payment_type() -> String {
    "rent".to_string()
}

impl Payment {
    /// Create a rent payment record
    pub fn new(
        property_id: impl Into<String>,
        due_date: NaiveDate,
        amount: f64,
        status: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            property_id: property_id.into(),
            payment_date: None,
            due_date,
            amount,
            status: status.into(),
            payment_type: default_payment_type(),
        }
    }

    /// Builder method: set the date the payment arrived
    pub fn paid_on(mut self, payment_date: NaiveDate) -> Self {
        self.payment_date = Some(payment_date);
        self
    }
}

/// A to-do item on the landlord's dashboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub landlord_id: String,
    #[serde(default)]
    pub property_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// ai_completed, ai_pending, human_attention
    pub task_type: String,
    pub priority: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        landlord_id: impl Into<String>,
        title: impl Into<String>,
        task_type: impl Into<String>,
        priority: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            landlord_id: landlord_id.into(),
            property_id: None,
            title: title.into(),
            description: String::new(),
            task_type: task_type.into(),
            priority: priority.into(),
            due_date: None,
            completed_date: None,
            created_at: Utc::now(),
        }
    }

    /// Builder method: set description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder method: attach to a property
    pub fn property(mut self, property_id: impl Into<String>) -> Self {
        self.property_id = Some(property_id.into());
        self
    }

    pub fn due(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn completed(mut self, completed_date: NaiveDate) -> Self {
        self.completed_date = Some(completed_date);
        self
    }

    /// Builder method: set creation time
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// A property joined with its value records, tenants and payments
///
/// `values` are ordered newest `value_date` first and `payments` newest
/// `due_date` first, so the first element of each is the latest one.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRecord {
    pub property: Property,
    pub values: Vec<PropertyValue>,
    pub tenants: Vec<Tenant>,
    pub payments: Vec<Payment>,
}

impl PropertyRecord {
    pub fn new(property: Property) -> Self {
        Self {
            property,
            values: Vec::new(),
            tenants: Vec::new(),
            payments: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: PropertyValue) -> Self {
        self.values.push(value);
        self
    }

    pub fn with_tenant(mut self, tenant: Tenant) -> Self {
        self.tenants.push(tenant);
        self
    }

    pub fn with_payment(mut self, payment: Payment) -> Self {
        self.payments.push(payment);
        self
    }
}

/// The caller behind a bearer token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    #[serde(rename = "id")]
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
}
