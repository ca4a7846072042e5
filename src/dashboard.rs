//! Dashboard Aggregation
//!
//! Turns a landlord's portfolio (properties joined with values, tenants and
//! payments) into per-property rows and portfolio metrics. Everything here is
//! a pure function of its inputs plus `today`, so the live dashboard and the
//! demo page share one code path.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::store::{Payment, Property, PropertyRecord, PropertyValue, Task, Tenant, ValueType};

/// Most recent tasks shown on the dashboard
pub const DASHBOARD_TASK_LIMIT: usize = 20;

/// Payment standing derived from a property's latest payment
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    OnTime,
    Late,
    Overdue,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::OnTime => "on_time",
            PaymentStatus::Late => "late",
            PaymentStatus::Overdue => "overdue",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the latest payment as of `today`
///
/// An unpaid payment is overdue from its due date onward, the due day included.
pub fn derive_payment_status(latest: Option<&Payment>, today: NaiveDate) -> PaymentStatus {
    let Some(payment) = latest else {
        return PaymentStatus::OnTime;
    };

    match payment.status.as_str() {
        "paid" => match payment.payment_date {
            Some(paid) if paid > payment.due_date => PaymentStatus::Late,
            _ => PaymentStatus::OnTime,
        },
        "overdue" => PaymentStatus::Overdue,
        _ if today >= payment.due_date => PaymentStatus::Overdue,
        _ => PaymentStatus::OnTime,
    }
}

/// One property row on the dashboard
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedProperty {
    pub id: String,
    pub address: String,
    pub value: f64,
    pub monthly_rent: f64,
    pub is_occupied: bool,
    pub last_payment_date: Option<NaiveDate>,
    pub payment_status: PaymentStatus,
    pub zillow_value: Option<f64>,
}

/// Reduce a joined property record to its dashboard row
pub fn process_property(record: &PropertyRecord, today: NaiveDate) -> ProcessedProperty {
    let latest_value = record.values.first();
    let active_tenant = record.tenants.iter().find(|t| t.is_active);
    let latest_payment = record.payments.first();

    ProcessedProperty {
        id: record.property.id.clone(),
        address: record.property.display_address(),
        value: latest_value.map(|v| v.value_amount).unwrap_or(0.0),
        monthly_rent: active_tenant.map(|t| t.monthly_rent).unwrap_or(0.0),
        is_occupied: active_tenant.is_some(),
        last_payment_date: latest_payment.and_then(|p| p.payment_date),
        payment_status: derive_payment_status(latest_payment, today),
        zillow_value: latest_value
            .filter(|v| v.source == "zillow")
            .map(|v| v.value_amount),
    }
}

/// Portfolio totals
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_value: f64,
    pub monthly_rent_collected: f64,
    pub monthly_rent_to_collect: f64,
    /// Percentage, 0.0 - 100.0
    pub occupancy_rate: f64,
    pub late_payments: usize,
    pub overdue_payments: usize,
}

pub fn compute_metrics(properties: &[ProcessedProperty]) -> DashboardMetrics {
    let mut metrics = DashboardMetrics::default();
    let mut occupied = 0usize;

    for property in properties {
        metrics.total_value += property.value;

        match property.payment_status {
            PaymentStatus::OnTime => metrics.monthly_rent_collected += property.monthly_rent,
            PaymentStatus::Late => {
                metrics.monthly_rent_to_collect += property.monthly_rent;
                metrics.late_payments += 1;
            }
            PaymentStatus::Overdue => {
                metrics.monthly_rent_to_collect += property.monthly_rent;
                metrics.overdue_payments += 1;
            }
        }

        if property.is_occupied {
            occupied += 1;
        }
    }

    if !properties.is_empty() {
        metrics.occupancy_rate = occupied as f64 / properties.len() as f64 * 100.0;
    }

    metrics
}

/// One task row on the dashboard
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedTask {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub task_type: String,
    pub priority: String,
    pub due_date: Option<NaiveDate>,
    pub completed_date: Option<NaiveDate>,
    pub property_id: Option<String>,
}

impl From<Task> for ProcessedTask {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            task_type: task.task_type,
            priority: task.priority,
            due_date: task.due_date,
            completed_date: task.completed_date,
            property_id: task.property_id,
        }
    }
}

/// Body of `GET /api/dashboard`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardResponse {
    pub properties: Vec<ProcessedProperty>,
    pub tasks: Vec<ProcessedTask>,
    pub metrics: DashboardMetrics,
}

/// Aggregate a portfolio and its tasks as of `today`
pub fn build_dashboard(
    records: &[PropertyRecord],
    tasks: Vec<Task>,
    today: NaiveDate,
) -> DashboardResponse {
    let properties: Vec<ProcessedProperty> = records
        .iter()
        .map(|record| process_property(record, today))
        .collect();
    let metrics = compute_metrics(&properties);

    DashboardResponse {
        properties,
        tasks: tasks
            .into_iter()
            .take(DASHBOARD_TASK_LIMIT)
            .map(ProcessedTask::from)
            .collect(),
        metrics,
    }
}

// ============================================
// DEMO PORTFOLIO
// ============================================

/// Landlord id owning the demo portfolio
pub const DEMO_LANDLORD_ID: &str = "demo-landlord";

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

fn at_noon(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(12, 0, 0)
        .map(|noon| Utc.from_utc_datetime(&noon))
        .unwrap_or_else(Utc::now)
}

/// Reference date the demo portfolio is evaluated against
pub fn demo_today() -> NaiveDate {
    date(2024, 1, 25)
}

fn demo_value(property: &Property, amount: f64, source: &str) -> PropertyValue {
    PropertyValue {
        id: format!("{}-value", property.id),
        property_id: property.id.clone(),
        value_type: if source == "zillow" {
            ValueType::Zillow
        } else {
            ValueType::Manual
        },
        value_amount: amount,
        value_date: date(2024, 1, 1),
        source: source.to_string(),
        confidence_score: if source == "zillow" { 0.85 } else { 1.0 },
        created_at: at_noon(date(2024, 1, 1)),
    }
}

fn demo_property(id: &str, address: &str, city: &str, day: u32) -> Property {
    let mut property = Property::new(DEMO_LANDLORD_ID, address, city, "CA", "90001")
        .created_at(at_noon(date(2023, 6, day)));
    property.id = id.to_string();
    property
}

/// Fixed four-property portfolio: two on time, one late, one overdue and vacant
pub fn demo_portfolio() -> Vec<PropertyRecord> {
    let main = demo_property("demo-1", "123 Main St", "Downtown", 4);
    let oak = demo_property("demo-2", "456 Oak Ave", "Suburbs", 3);
    let pine = demo_property("demo-3", "789 Pine Rd", "City Center", 2);
    let elm = demo_property("demo-4", "321 Elm St", "Westside", 1);

    vec![
        PropertyRecord::new(main.clone())
            .with_value(demo_value(&main, 450_000.0, "zillow"))
            .with_tenant(Tenant::new(&main.id, "Ana", "Lopez", 2_800.0))
            .with_payment(
                Payment::new(&main.id, date(2024, 1, 15), 2_800.0, "paid").paid_on(date(2024, 1, 15)),
            ),
        PropertyRecord::new(oak.clone())
            .with_value(demo_value(&oak, 320_000.0, "landlord"))
            .with_tenant(Tenant::new(&oak.id, "Ben", "Carter", 2_100.0))
            .with_payment(
                Payment::new(&oak.id, date(2024, 1, 5), 2_100.0, "paid").paid_on(date(2024, 1, 10)),
            ),
        PropertyRecord::new(pine.clone())
            .with_value(demo_value(&pine, 580_000.0, "zillow"))
            .with_tenant(Tenant::new(&pine.id, "Cleo", "Diaz", 3_500.0).inactive())
            .with_payment(Payment::new(&pine.id, date(2024, 1, 1), 3_500.0, "overdue")),
        PropertyRecord::new(elm.clone())
            .with_value(demo_value(&elm, 380_000.0, "landlord"))
            .with_tenant(Tenant::new(&elm.id, "Dev", "Evans", 2_400.0))
            .with_payment(
                Payment::new(&elm.id, date(2024, 1, 20), 2_400.0, "paid").paid_on(date(2024, 1, 20)),
            ),
    ]
}

/// Task feed that goes with [`demo_portfolio`]
pub fn demo_tasks() -> Vec<Task> {
    vec![
        Task::new(DEMO_LANDLORD_ID, "Lease Renewal Processed", "ai_completed", "medium")
            .description("AI automatically processed lease renewal for 123 Main St")
            .property("demo-1")
            .completed(date(2024, 1, 20))
            .created_at(at_noon(date(2024, 1, 20))),
        Task::new(DEMO_LANDLORD_ID, "Maintenance Request Scheduled", "ai_pending", "high")
            .description("Plumbing repair scheduled for 456 Oak Ave")
            .property("demo-2")
            .due(date(2024, 1, 25))
            .created_at(at_noon(date(2024, 1, 19))),
        Task::new(DEMO_LANDLORD_ID, "Late Payment Follow-up", "human_attention", "high")
            .description("Tenant at 789 Pine Rd has overdue payment - requires human intervention")
            .property("demo-3")
            .due(date(2024, 1, 22))
            .created_at(at_noon(date(2024, 1, 18))),
        Task::new(DEMO_LANDLORD_ID, "Property Value Update", "ai_completed", "low")
            .description("AI updated property values using latest market data")
            .completed(date(2024, 1, 19))
            .created_at(at_noon(date(2024, 1, 17))),
    ]
}

/// The demo dashboard, aggregated exactly like a live one
pub fn demo_dashboard() -> DashboardResponse {
    build_dashboard(&demo_portfolio(), demo_tasks(), demo_today())
}

/// Demo portfolio and tasks owned by `landlord_id`
///
/// Fixed row ids are namespaced by the landlord so several accounts can
/// hold their own copy in one datastore.
pub fn demo_seed(landlord_id: &str) -> (Vec<PropertyRecord>, Vec<Task>) {
    let rename = |id: &str| {
        if landlord_id == DEMO_LANDLORD_ID {
            id.to_string()
        } else {
            format!("{}:{}", landlord_id, id)
        }
    };

    let records = demo_portfolio()
        .into_iter()
        .map(|mut record| {
            record.property.landlord_id = landlord_id.to_string();
            record.property.id = rename(&record.property.id);
            for value in &mut record.values {
                value.id = rename(&value.id);
                value.property_id = record.property.id.clone();
            }
            for tenant in &mut record.tenants {
                tenant.property_id = record.property.id.clone();
            }
            for payment in &mut record.payments {
                payment.property_id = record.property.id.clone();
            }
            record
        })
        .collect();

    let tasks = demo_tasks()
        .into_iter()
        .map(|mut task| {
            task.landlord_id = landlord_id.to_string();
            task.property_id = task.property_id.as_deref().map(rename);
            task
        })
        .collect();

    (records, tasks)
}
