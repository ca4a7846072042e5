//! # Gustavo
//!
//! Backend for an AI-assisted property management product: a prospect
//! waitlist, property-service scheduling requests, and a landlord dashboard
//! with portfolio metrics and property valuations.
//!
//! ## Modules
//!
//! - [`store`]: Datastore trait with SQLite and hosted REST backends
//! - [`valuation`]: Zillow lookups with a deterministic mock fallback
//! - [`dashboard`]: Portfolio aggregation and the demo portfolio
//! - [`pages`]: Server-rendered HTML pages
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gustavo::api::{serve, ApiConfig, AppState};
//! use gustavo::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!
//!     let store = config.database.open()?;
//!     let valuation = config.valuation.service()?;
//!     let api_config = ApiConfig::from(config.server.clone());
//!
//!     serve(AppState::new(store, valuation, api_config.clone()), &api_config).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod dashboard;
pub mod pages;
pub mod store;
pub mod valuation;

// Re-export top-level types for convenience
pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{Config, ConfigError, DatabaseConfig, DatastoreBackend, LoggingConfig};

pub use dashboard::{build_dashboard, DashboardMetrics, DashboardResponse, PaymentStatus};

pub use store::{Datastore, RestStore, SqliteStore, StoreError, StoreResult};

pub use valuation::{PropertyEstimate, RentEstimate, ValuationError, ValuationService};
