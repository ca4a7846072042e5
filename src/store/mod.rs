//! Gustavo Datastore
//!
//! Every HTTP handler is a leaf that talks to one [`Datastore`]. Two
//! backends implement it:
//!
//! - **sqlite**: embedded database file (or in-memory) via rusqlite
//! - **rest**: hosted PostgREST-style service via reqwest
//!
//! # Tables
//!
//! ```text
//! waitlist  scheduling_requests  properties  property_values
//! tenants   payments             tasks       auth_sessions
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use gustavo::store::{Datastore, NewWaitlistEntry, SqliteStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SqliteStore::open("./gustavo.db")?;
//!
//!     let entry = store
//!         .insert_waitlist_entry(NewWaitlistEntry {
//!             name: "Ada".to_string(),
//!             email: "ada@example.com".to_string(),
//!             user_type: None,
//!         })
//!         .await?;
//!
//!     println!("Joined waitlist: {}", entry.id);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod rest;
pub mod sqlite;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use rest::{RestStore, RestStoreConfig};
pub use sqlite::SqliteStore;
pub use types::{
    AuthUser, NewPropertyValue, NewSchedulingRequest, NewWaitlistEntry, Payment, Priority,
    Property, PropertyRecord, PropertyValue, SchedulingRequest, SchedulingStatus, ServiceType,
    Task, Tenant, ValueType, WaitlistEntry,
};

use async_trait::async_trait;

/// Table/row operations the HTTP layer needs from a datastore backend
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// Cheap round trip used by readiness probes
    async fn ping(&self) -> StoreResult<()>;

    // ---- waitlist ----

    /// Look up an entry by its normalised (trimmed, lower-cased) email
    async fn find_waitlist_entry(&self, email: &str) -> StoreResult<Option<WaitlistEntry>>;

    /// Insert an entry; a uniqueness violation on email is `StoreError::Duplicate`
    async fn insert_waitlist_entry(&self, entry: NewWaitlistEntry) -> StoreResult<WaitlistEntry>;

    /// All entries, newest first
    async fn list_waitlist(&self) -> StoreResult<Vec<WaitlistEntry>>;

    // ---- scheduling ----

    async fn insert_scheduling_request(
        &self,
        request: NewSchedulingRequest,
    ) -> StoreResult<SchedulingRequest>;

    async fn get_scheduling_request(&self, id: &str) -> StoreResult<Option<SchedulingRequest>>;

    /// Requests for one property, newest first
    async fn list_scheduling_requests(
        &self,
        property_id: &str,
    ) -> StoreResult<Vec<SchedulingRequest>>;

    // ---- auth ----

    /// Resolve a bearer token to its user, `None` when the token is unknown
    async fn resolve_user(&self, token: &str) -> StoreResult<Option<AuthUser>>;

    // ---- portfolio ----

    /// A property, only when it belongs to `landlord_id`
    async fn find_property(
        &self,
        property_id: &str,
        landlord_id: &str,
    ) -> StoreResult<Option<Property>>;

    /// Properties of a landlord that have at least one value row, newest
    /// first, joined with their rows
    async fn landlord_portfolio(&self, landlord_id: &str) -> StoreResult<Vec<PropertyRecord>>;

    /// Most recent tasks of a landlord
    async fn recent_tasks(&self, landlord_id: &str, limit: usize) -> StoreResult<Vec<Task>>;

    /// Value rows of a property, newest `value_date` first
    async fn list_property_values(&self, property_id: &str) -> StoreResult<Vec<PropertyValue>>;

    /// Insert or replace the row keyed on (property_id, value_type, value_date)
    async fn upsert_property_value(&self, value: NewPropertyValue) -> StoreResult<PropertyValue>;
}
