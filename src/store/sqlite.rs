//! SQLite Datastore - embedded backend
//!
//! Holds every table in one SQLite file (or in memory for tests). The
//! connection sits behind a `std::sync::Mutex` because rusqlite's
//! `Connection` is not `Sync`; the guard is never held across an `.await`.
//!
//! The waitlist carries a unique index on `lower(email)`, so two racing
//! signups with the same address cannot both land.

use crate::store::error::{StoreError, StoreResult};
use crate::store::types::*;
use crate::store::Datastore;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS waitlist (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    user_type TEXT,
    created_at TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_waitlist_email ON waitlist(lower(email));

CREATE TABLE IF NOT EXISTS scheduling_requests (
    id TEXT PRIMARY KEY,
    property_id TEXT NOT NULL,
    service_type TEXT NOT NULL,
    priority TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    participants TEXT NOT NULL,
    preferred_dates TEXT NOT NULL DEFAULT '[]',
    preferred_time_slots TEXT NOT NULL DEFAULT '[]',
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_scheduling_property ON scheduling_requests(property_id);

CREATE TABLE IF NOT EXISTS properties (
    id TEXT PRIMARY KEY,
    landlord_id TEXT NOT NULL,
    address TEXT NOT NULL,
    unit_number TEXT,
    city TEXT NOT NULL,
    state TEXT NOT NULL,
    zip_code TEXT NOT NULL,
    property_type TEXT NOT NULL,
    bedrooms INTEGER,
    bathrooms REAL,
    square_feet INTEGER,
    year_built INTEGER,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_properties_landlord ON properties(landlord_id);

CREATE TABLE IF NOT EXISTS property_values (
    id TEXT PRIMARY KEY,
    property_id TEXT NOT NULL REFERENCES properties(id),
    value_type TEXT NOT NULL,
    value_amount REAL NOT NULL,
    value_date TEXT NOT NULL,
    source TEXT NOT NULL,
    confidence_score REAL NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (property_id, value_type, value_date)
);

CREATE TABLE IF NOT EXISTS tenants (
    id TEXT PRIMARY KEY,
    property_id TEXT NOT NULL REFERENCES properties(id),
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    monthly_rent REAL NOT NULL,
    is_active INTEGER NOT NULL,
    lease_end_date TEXT
);

CREATE TABLE IF NOT EXISTS payments (
    id TEXT PRIMARY KEY,
    property_id TEXT NOT NULL REFERENCES properties(id),
    payment_date TEXT,
    due_date TEXT NOT NULL,
    amount REAL NOT NULL,
    status TEXT NOT NULL,
    payment_type TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    landlord_id TEXT NOT NULL,
    property_id TEXT,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    task_type TEXT NOT NULL,
    priority TEXT NOT NULL,
    due_date TEXT,
    completed_date TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tasks_landlord ON tasks(landlord_id);

CREATE TABLE IF NOT EXISTS auth_sessions (
    token TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    email TEXT,
    created_at TEXT NOT NULL
);
";

/// Embedded datastore backed by a single SQLite connection
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a database file and apply the schema
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        Self::init(conn)
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(format!("Failed to acquire connection lock: {}", e)))
    }

    // ---- seeding helpers (CLI and tests) ----

    /// Insert a property row
    pub fn insert_property(&self, property: &Property) -> StoreResult<()> {
        put_property(&*self.conn()?, property)
    }

    /// Insert a tenant row
    pub fn insert_tenant(&self, tenant: &Tenant) -> StoreResult<()> {
        put_tenant(&*self.conn()?, tenant)
    }

    /// Insert a payment row
    pub fn insert_payment(&self, payment: &Payment) -> StoreResult<()> {
        put_payment(&*self.conn()?, payment)
    }

    /// Insert a task row
    pub fn insert_task(&self, task: &Task) -> StoreResult<()> {
        put_task(&*self.conn()?, task)
    }

    /// Insert a value row as-is (no upsert)
    pub fn insert_property_value(&self, value: &PropertyValue) -> StoreResult<()> {
        put_property_value(&*self.conn()?, value)
    }

    /// Insert a property together with its value, tenant and payment rows
    ///
    /// All rows land in one transaction, so a failed child insert leaves
    /// no orphaned property behind.
    pub fn insert_record(&self, record: &PropertyRecord) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        put_property(&tx, &record.property)?;
        for value in &record.values {
            put_property_value(&tx, value)?;
        }
        for tenant in &record.tenants {
            put_tenant(&tx, tenant)?;
        }
        for payment in &record.payments {
            put_payment(&tx, payment)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Create a bearer token for a user and return it
    pub fn issue_token(&self, user_id: &str, email: Option<&str>) -> StoreResult<String> {
        let token = format!("gst_{}", uuid::Uuid::new_v4().simple());
        self.conn()?.execute(
            "INSERT INTO auth_sessions (token, user_id, email, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![token, user_id, email, Utc::now()],
        )?;
        Ok(token)
    }
}

fn put_property(conn: &Connection, property: &Property) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO properties (id, landlord_id, address, unit_number, city, state, zip_code,
            property_type, bedrooms, bathrooms, square_feet, year_built, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            property.id,
            property.landlord_id,
            property.address,
            property.unit_number,
            property.city,
            property.state,
            property.zip_code,
            property.property_type,
            property.bedrooms,
            property.bathrooms,
            property.square_feet,
            property.year_built,
            property.created_at,
        ],
    )?;
    Ok(())
}

fn put_tenant(conn: &Connection, tenant: &Tenant) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO tenants (id, property_id, first_name, last_name, monthly_rent, is_active, lease_end_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            tenant.id,
            tenant.property_id,
            tenant.first_name,
            tenant.last_name,
            tenant.monthly_rent,
            tenant.is_active,
            tenant.lease_end_date,
        ],
    )?;
    Ok(())
}

fn put_payment(conn: &Connection, payment: &Payment) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO payments (id, property_id, payment_date, due_date, amount, status, payment_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            payment.id,
            payment.property_id,
            payment.payment_date,
            payment.due_date,
            payment.amount,
            payment.status,
            payment.payment_type,
        ],
    )?;
    Ok(())
}

fn put_task(conn: &Connection, task: &Task) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO tasks (id, landlord_id, property_id, title, description, task_type, priority,
            due_date, completed_date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            task.id,
            task.landlord_id,
            task.property_id,
            task.title,
            task.description,
            task.task_type,
            task.priority,
            task.due_date,
            task.completed_date,
            task.created_at,
        ],
    )?;
    Ok(())
}

fn put_property_value(conn: &Connection, value: &PropertyValue) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO property_values (id, property_id, value_type, value_amount, value_date,
            source, confidence_score, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            value.id,
            value.property_id,
            value.value_type.as_str(),
            value.value_amount,
            value.value_date,
            value.source,
            value.confidence_score,
            value.created_at,
        ],
    )?;
    Ok(())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn text_conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, message.into())
}

fn parse_column<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| text_conversion_error(idx, e))
}

fn json_list_column(row: &Row, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| text_conversion_error(idx, e.to_string()))
}

const WAITLIST_COLUMNS: &str = "id, name, email, user_type, created_at";

fn waitlist_from_row(row: &Row) -> rusqlite::Result<WaitlistEntry> {
    Ok(WaitlistEntry {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        user_type: row.get(3)?,
        created_at: row.get(4)?,
    })
}

const SCHEDULING_COLUMNS: &str = "id, property_id, service_type, priority, description, participants,
    preferred_dates, preferred_time_slots, status, created_at, updated_at";

fn scheduling_from_row(row: &Row) -> rusqlite::Result<SchedulingRequest> {
    Ok(SchedulingRequest {
        id: row.get(0)?,
        property_id: row.get(1)?,
        service_type: parse_column(row, 2)?,
        priority: parse_column(row, 3)?,
        description: row.get(4)?,
        participants: json_list_column(row, 5)?,
        preferred_dates: json_list_column(row, 6)?,
        preferred_time_slots: json_list_column(row, 7)?,
        status: parse_column(row, 8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

const PROPERTY_COLUMNS: &str = "id, landlord_id, address, unit_number, city, state, zip_code,
    property_type, bedrooms, bathrooms, square_feet, year_built, created_at";

fn property_from_row(row: &Row) -> rusqlite::Result<Property> {
    Ok(Property {
        id: row.get(0)?,
        landlord_id: row.get(1)?,
        address: row.get(2)?,
        unit_number: row.get(3)?,
        city: row.get(4)?,
        state: row.get(5)?,
        zip_code: row.get(6)?,
        property_type: row.get(7)?,
        bedrooms: row.get(8)?,
        bathrooms: row.get(9)?,
        square_feet: row.get(10)?,
        year_built: row.get(11)?,
        created_at: row.get(12)?,
    })
}

const VALUE_COLUMNS: &str =
    "id, property_id, value_type, value_amount, value_date, source, confidence_score, created_at";

fn value_from_row(row: &Row) -> rusqlite::Result<PropertyValue> {
    Ok(PropertyValue {
        id: row.get(0)?,
        property_id: row.get(1)?,
        value_type: parse_column(row, 2)?,
        value_amount: row.get(3)?,
        value_date: row.get(4)?,
        source: row.get(5)?,
        confidence_score: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn tenant_from_row(row: &Row) -> rusqlite::Result<Tenant> {
    Ok(Tenant {
        id: row.get(0)?,
        property_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        monthly_rent: row.get(4)?,
        is_active: row.get(5)?,
        lease_end_date: row.get(6)?,
    })
}

fn payment_from_row(row: &Row) -> rusqlite::Result<Payment> {
    Ok(Payment {
        id: row.get(0)?,
        property_id: row.get(1)?,
        payment_date: row.get(2)?,
        due_date: row.get(3)?,
        amount: row.get(4)?,
        status: row.get(5)?,
        payment_type: row.get(6)?,
    })
}

fn task_from_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        landlord_id: row.get(1)?,
        property_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        task_type: row.get(5)?,
        priority: row.get(6)?,
        due_date: row.get(7)?,
        completed_date: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn values_for(conn: &Connection, property_id: &str) -> rusqlite::Result<Vec<PropertyValue>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM property_values WHERE property_id = ?1
         ORDER BY value_date DESC, created_at DESC",
        VALUE_COLUMNS
    ))?;
    let rows = stmt.query_map([property_id], value_from_row)?;
    rows.collect()
}

#[async_trait]
impl Datastore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn ping(&self) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    async fn find_waitlist_entry(&self, email: &str) -> StoreResult<Option<WaitlistEntry>> {
        let conn = self.conn()?;
        let entry = conn
            .query_row(
                &format!(
                    "SELECT {} FROM waitlist WHERE lower(email) = lower(?1)",
                    WAITLIST_COLUMNS
                ),
                [email],
                waitlist_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    async fn insert_waitlist_entry(&self, entry: NewWaitlistEntry) -> StoreResult<WaitlistEntry> {
        let entry = entry.into_entry();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO waitlist (id, name, email, user_type, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.id,
                entry.name,
                entry.email,
                entry.user_type,
                entry.created_at
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Duplicate(format!("waitlist email {}", entry.email))
            } else {
                StoreError::Sqlite(e)
            }
        })?;
        Ok(entry)
    }

    async fn list_waitlist(&self) -> StoreResult<Vec<WaitlistEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM waitlist ORDER BY created_at DESC, rowid DESC",
            WAITLIST_COLUMNS
        ))?;
        let entries = stmt
            .query_map([], waitlist_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    async fn insert_scheduling_request(
        &self,
        request: NewSchedulingRequest,
    ) -> StoreResult<SchedulingRequest> {
        let request = request.into_request();
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO scheduling_requests ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                SCHEDULING_COLUMNS
            ),
            params![
                request.id,
                request.property_id,
                request.service_type.as_str(),
                request.priority.as_str(),
                request.description,
                serde_json::to_string(&request.participants)?,
                serde_json::to_string(&request.preferred_dates)?,
                serde_json::to_string(&request.preferred_time_slots)?,
                request.status.as_str(),
                request.created_at,
                request.updated_at,
            ],
        )?;
        Ok(request)
    }

    async fn get_scheduling_request(&self, id: &str) -> StoreResult<Option<SchedulingRequest>> {
        let conn = self.conn()?;
        let request = conn
            .query_row(
                &format!(
                    "SELECT {} FROM scheduling_requests WHERE id = ?1",
                    SCHEDULING_COLUMNS
                ),
                [id],
                scheduling_from_row,
            )
            .optional()?;
        Ok(request)
    }

    async fn list_scheduling_requests(
        &self,
        property_id: &str,
    ) -> StoreResult<Vec<SchedulingRequest>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM scheduling_requests WHERE property_id = ?1
             ORDER BY created_at DESC, rowid DESC",
            SCHEDULING_COLUMNS
        ))?;
        let requests = stmt
            .query_map([property_id], scheduling_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(requests)
    }

    async fn resolve_user(&self, token: &str) -> StoreResult<Option<AuthUser>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT user_id, email FROM auth_sessions WHERE token = ?1",
                [token],
                |row| {
                    Ok(AuthUser {
                        user_id: row.get(0)?,
                        email: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    async fn find_property(
        &self,
        property_id: &str,
        landlord_id: &str,
    ) -> StoreResult<Option<Property>> {
        let conn = self.conn()?;
        let property = conn
            .query_row(
                &format!(
                    "SELECT {} FROM properties WHERE id = ?1 AND landlord_id = ?2",
                    PROPERTY_COLUMNS
                ),
                params![property_id, landlord_id],
                property_from_row,
            )
            .optional()?;
        Ok(property)
    }

    async fn landlord_portfolio(&self, landlord_id: &str) -> StoreResult<Vec<PropertyRecord>> {
        let conn = self.conn()?;

        let properties = {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {} FROM properties WHERE landlord_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
                PROPERTY_COLUMNS
            ))?;
            let rows = stmt.query_map([landlord_id], property_from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };

        let mut tenant_stmt = conn.prepare_cached(
            "SELECT id, property_id, first_name, last_name, monthly_rent, is_active, lease_end_date
             FROM tenants WHERE property_id = ?1 ORDER BY rowid",
        )?;
        let mut payment_stmt = conn.prepare_cached(
            "SELECT id, property_id, payment_date, due_date, amount, status, payment_type
             FROM payments WHERE property_id = ?1 ORDER BY due_date DESC, rowid DESC",
        )?;

        let mut records = Vec::with_capacity(properties.len());
        for property in properties {
            // Only valued properties appear on the dashboard
            let values = values_for(&conn, &property.id)?;
            if values.is_empty() {
                continue;
            }
            let tenants = tenant_stmt
                .query_map([&property.id], tenant_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            let payments = payment_stmt
                .query_map([&property.id], payment_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            records.push(PropertyRecord {
                property,
                values,
                tenants,
                payments,
            });
        }

        Ok(records)
    }

    async fn recent_tasks(&self, landlord_id: &str, limit: usize) -> StoreResult<Vec<Task>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, landlord_id, property_id, title, description, task_type, priority,
                due_date, completed_date, created_at
             FROM tasks WHERE landlord_id = ?1
             ORDER BY created_at DESC, rowid DESC LIMIT ?2",
        )?;
        let tasks = stmt
            .query_map(params![landlord_id, limit as i64], task_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    async fn list_property_values(&self, property_id: &str) -> StoreResult<Vec<PropertyValue>> {
        let conn = self.conn()?;
        Ok(values_for(&conn, property_id)?)
    }

    async fn upsert_property_value(&self, value: NewPropertyValue) -> StoreResult<PropertyValue> {
        let value = value.into_value();
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO property_values ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT (property_id, value_type, value_date) DO UPDATE SET
                    value_amount = excluded.value_amount,
                    source = excluded.source,
                    confidence_score = excluded.confidence_score,
                    created_at = excluded.created_at",
                VALUE_COLUMNS
            ),
            params![
                value.id,
                value.property_id,
                value.value_type.as_str(),
                value.value_amount,
                value.value_date,
                value.source,
                value.confidence_score,
                value.created_at,
            ],
        )?;

        // On conflict the existing row keeps its id, so read back what is stored
        let stored = conn.query_row(
            &format!(
                "SELECT {} FROM property_values
                 WHERE property_id = ?1 AND value_type = ?2 AND value_date = ?3",
                VALUE_COLUMNS
            ),
            params![
                value.property_id,
                value.value_type.as_str(),
                value.value_date
            ],
            value_from_row,
        )?;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use tempfile::tempdir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn new_entry(name: &str, email: &str) -> NewWaitlistEntry {
        NewWaitlistEntry {
            name: name.to_string(),
            email: email.to_string(),
            user_type: None,
        }
    }

    #[tokio::test]
    async fn test_waitlist_insert_and_find() {
        let store = SqliteStore::open_in_memory().unwrap();

        let entry = store
            .insert_waitlist_entry(new_entry("Ada", "ada@example.com"))
            .await
            .unwrap();

        let found = store
            .find_waitlist_entry("ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, entry);

        assert!(store
            .find_waitlist_entry("bob@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_waitlist_unique_email_is_case_insensitive() {
        let store = SqliteStore::open_in_memory().unwrap();

        store
            .insert_waitlist_entry(new_entry("Ada", "ada@example.com"))
            .await
            .unwrap();

        let err = store
            .insert_waitlist_entry(new_entry("Ada again", "ADA@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));

        assert_eq!(store.list_waitlist().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_waitlist_list_newest_first() {
        let store = SqliteStore::open_in_memory().unwrap();

        store
            .insert_waitlist_entry(new_entry("First", "first@example.com"))
            .await
            .unwrap();
        store
            .insert_waitlist_entry(new_entry("Second", "second@example.com"))
            .await
            .unwrap();

        let entries = store.list_waitlist().await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn test_scheduling_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();

        let created = store
            .insert_scheduling_request(NewSchedulingRequest {
                property_id: "prop-1".to_string(),
                service_type: ServiceType::Repair,
                priority: Priority::Urgent,
                description: "Leaking sink".to_string(),
                participants: vec!["tenant@example.com".to_string(), "+15550100".to_string()],
                preferred_dates: vec!["2024-02-01".to_string()],
                preferred_time_slots: vec!["09:00-11:00".to_string()],
            })
            .await
            .unwrap();

        let fetched = store
            .get_scheduling_request(&created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.status, SchedulingStatus::Pending);

        let for_property = store.list_scheduling_requests("prop-1").await.unwrap();
        assert_eq!(for_property.len(), 1);
        assert!(store
            .list_scheduling_requests("prop-2")
            .await
            .unwrap()
            .is_empty());
        assert!(store.get_scheduling_request("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_issue_and_resolve_token() {
        let store = SqliteStore::open_in_memory().unwrap();

        let token = store.issue_token("landlord-1", Some("owner@example.com")).unwrap();
        let user = store.resolve_user(&token).await.unwrap().unwrap();
        assert_eq!(user.user_id, "landlord-1");
        assert_eq!(user.email.as_deref(), Some("owner@example.com"));

        assert!(store.resolve_user("bogus").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_property_checks_owner() {
        let store = SqliteStore::open_in_memory().unwrap();
        let property = Property::new("landlord-1", "1 Elm St", "Austin", "TX", "78701");
        store.insert_property(&property).unwrap();

        assert!(store
            .find_property(&property.id, "landlord-1")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_property(&property.id, "landlord-2")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_upsert_property_value_replaces_same_day() {
        let store = SqliteStore::open_in_memory().unwrap();
        let property = Property::new("landlord-1", "1 Elm St", "Austin", "TX", "78701");
        store.insert_property(&property).unwrap();

        let first = store
            .upsert_property_value(NewPropertyValue {
                property_id: property.id.clone(),
                value_type: ValueType::Manual,
                value_amount: 400_000.0,
                value_date: date("2024-03-01"),
                source: "landlord".to_string(),
                confidence_score: 1.0,
            })
            .await
            .unwrap();

        let second = store
            .upsert_property_value(NewPropertyValue {
                property_id: property.id.clone(),
                value_type: ValueType::Manual,
                value_amount: 410_000.0,
                value_date: date("2024-03-01"),
                source: "landlord".to_string(),
                confidence_score: 1.0,
            })
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.value_amount, 410_000.0);

        let values = store.list_property_values(&property.id).await.unwrap();
        assert_eq!(values.len(), 1);
    }

    #[tokio::test]
    async fn test_portfolio_orders_latest_first() {
        let store = SqliteStore::open_in_memory().unwrap();
        let now = Utc::now();

        let older = Property::new("landlord-1", "1 Elm St", "Austin", "TX", "78701")
            .created_at(now - Duration::days(2));
        let newer = Property::new("landlord-1", "2 Oak St", "Austin", "TX", "78701")
            .created_at(now);
        let foreign = Property::new("landlord-2", "3 Pine St", "Austin", "TX", "78701");
        let unvalued = Property::new("landlord-1", "4 Birch St", "Austin", "TX", "78701")
            .created_at(now - Duration::days(1));
        for p in [&older, &newer, &foreign, &unvalued] {
            store.insert_property(p).unwrap();
        }
        store
            .insert_tenant(&Tenant::new(&unvalued.id, "John", "Roe", 900.0))
            .unwrap();
        store
            .upsert_property_value(NewPropertyValue {
                property_id: older.id.clone(),
                value_type: ValueType::Zillow,
                value_amount: 250_000.0,
                value_date: date("2024-03-01"),
                source: "zillow".to_string(),
                confidence_score: 0.85,
            })
            .await
            .unwrap();

        store
            .insert_payment(&Payment::new(&newer.id, date("2024-01-01"), 1000.0, "paid"))
            .unwrap();
        store
            .insert_payment(&Payment::new(&newer.id, date("2024-02-01"), 1000.0, "pending"))
            .unwrap();
        store
            .insert_tenant(&Tenant::new(&newer.id, "Jane", "Doe", 1000.0))
            .unwrap();

        for (day, amount) in [("2024-01-01", 300_000.0), ("2024-06-01", 320_000.0)] {
            store
                .upsert_property_value(NewPropertyValue {
                    property_id: newer.id.clone(),
                    value_type: ValueType::Manual,
                    value_amount: amount,
                    value_date: date(day),
                    source: "landlord".to_string(),
                    confidence_score: 1.0,
                })
                .await
                .unwrap();
        }

        let portfolio = store.landlord_portfolio("landlord-1").await.unwrap();
        assert_eq!(portfolio.len(), 2);
        assert_eq!(portfolio[0].property.id, newer.id);
        assert_eq!(portfolio[1].property.id, older.id);

        let record = &portfolio[0];
        assert_eq!(record.values[0].value_amount, 320_000.0);
        assert_eq!(record.payments[0].due_date, date("2024-02-01"));
        assert_eq!(record.tenants.len(), 1);
        assert_eq!(portfolio[1].values.len(), 1);
        // A property without any value row is left out
        assert!(portfolio.iter().all(|r| r.property.id != unvalued.id));
    }

    #[tokio::test]
    async fn test_insert_record_is_atomic() {
        let store = SqliteStore::open_in_memory().unwrap();
        let property = Property::new("landlord-1", "1 Elm St", "Austin", "TX", "78701");
        let tenant = Tenant::new(&property.id, "Jane", "Doe", 1000.0);

        // Second tenant reuses the id, so the batch fails part way
        let record = PropertyRecord::new(property.clone())
            .with_tenant(tenant.clone())
            .with_tenant(tenant);
        assert!(store.insert_record(&record).is_err());

        let found = store.find_property(&property.id, "landlord-1").await.unwrap();
        assert!(found.is_none());

        // A retry with clean rows goes through
        let record = PropertyRecord::new(property.clone())
            .with_tenant(Tenant::new(&property.id, "Jane", "Doe", 1000.0));
        store.insert_record(&record).unwrap();
        assert!(store
            .find_property(&property.id, "landlord-1")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_recent_tasks_limit() {
        let store = SqliteStore::open_in_memory().unwrap();
        let now = Utc::now();

        for i in 0..5 {
            let task = Task::new("landlord-1", format!("Task {}", i), "ai_pending", "low")
                .created_at(now + Duration::minutes(i));
            store.insert_task(&task).unwrap();
        }

        let tasks = store.recent_tasks("landlord-1", 3).await.unwrap();
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].title, "Task 4");
    }

    #[tokio::test]
    async fn test_open_file_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("gustavo.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .insert_waitlist_entry(new_entry("Ada", "ada@example.com"))
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.list_waitlist().await.unwrap().len(), 1);
        store.ping().await.unwrap();
    }
}
