//! Gustavo HTTP API
//!
//! HTTP layer for Gustavo, built with Axum.
//!
//! # Endpoints
//!
//! ## Waitlist
//! - `POST /api/waitlist` - Join the waitlist
//! - `GET /api/waitlist` - List entries
//! - `GET /api/waitlist/export` - CSV export
//!
//! ## Scheduling
//! - `POST /api/scheduling` - Create a scheduling request
//! - `GET /api/scheduling?requestId=|propertyId=` - Read requests
//!
//! ## Portfolio (bearer token)
//! - `GET /api/dashboard` - Properties, tasks and metrics
//! - `GET /api/properties/values?propertyId=` - Value history
//! - `POST /api/properties/values` - Record a value
//! - `GET /api/properties/rent-estimate?propertyId=` - Rent estimate
//!
//! ## Valuation
//! - `POST /api/valuations/estimate` - Value an address
//!
//! ## Pages
//! - `GET /`, `/waitlist`, `/admin/waitlist`, `/scheduling`, `/demo`
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use gustavo::api::{serve, ApiConfig, AppState};
//! use gustavo::store::SqliteStore;
//! use gustavo::valuation::ValuationService;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(SqliteStore::open("./gustavo.db")?);
//!     let config = ApiConfig::default();
//!
//!     let state = AppState::new(store, ValuationService::mock_only()?, config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Waitlist routes
        .route(
            "/waitlist",
            post(routes::waitlist::join_waitlist).get(routes::waitlist::list_waitlist),
        )
        .route("/waitlist/export", get(routes::waitlist::export_waitlist))
        // Scheduling routes
        .route(
            "/scheduling",
            post(routes::scheduling::create_scheduling_request)
                .get(routes::scheduling::get_scheduling_requests),
        )
        // Portfolio routes
        .route("/dashboard", get(routes::dashboard::get_dashboard))
        .route(
            "/properties/values",
            get(routes::property_values::get_property_values)
                .post(routes::property_values::upsert_property_value),
        )
        .route(
            "/properties/rent-estimate",
            get(routes::property_values::get_rent_estimate),
        )
        // Valuation routes
        .route("/valuations/estimate", post(routes::valuations::estimate_value))
        .layer(DefaultBodyLimit::max(state.config.max_body_size));

    let page_routes = Router::new()
        .route("/", get(routes::pages::landing))
        .route("/waitlist", get(routes::pages::waitlist_form))
        .route("/admin/waitlist", get(routes::pages::admin_waitlist))
        .route("/scheduling", get(routes::pages::scheduling_form))
        .route("/demo", get(routes::pages::demo));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .merge(page_routes)
        .nest("/api", api_routes)
        .nest("/health", health_routes)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Any origin when none are configured, otherwise exactly the listed ones
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::permissive().allow_origin(AllowOrigin::list(allowed))
}

/// Start the HTTP server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let backend = state.store.backend();
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(backend = backend, "Gustavo listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Gustavo shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{demo_portfolio, demo_tasks, DEMO_LANDLORD_ID};
    use crate::store::{Property, SqliteStore};
    use crate::valuation::ValuationService;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    struct TestApp {
        router: Router,
        store: SqliteStore,
        token: String,
    }

    fn create_test_app() -> TestApp {
        let store = SqliteStore::open_in_memory().unwrap();
        for record in demo_portfolio() {
            store.insert_record(&record).unwrap();
        }
        for task in demo_tasks() {
            store.insert_task(&task).unwrap();
        }
        let token = store
            .issue_token(DEMO_LANDLORD_ID, Some("demo@example.com"))
            .unwrap();

        let state = AppState::new(
            Arc::new(store.clone()),
            ValuationService::mock_only().unwrap(),
            ApiConfig::default(),
        );

        TestApp {
            router: build_router(state),
            store,
            token,
        }
    }

    impl TestApp {
        async fn send(&self, request: Request<Body>) -> Response {
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn get(&self, uri: &str) -> Response {
            self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
        }

        async fn get_authed(&self, uri: &str) -> Response {
            self.send(
                Request::builder()
                    .uri(uri)
                    .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
        }

        async fn post_json(&self, uri: &str, body: Value, token: Option<&str>) -> Response {
            let mut builder = Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json");
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            self.send(builder.body(Body::from(body.to_string())).unwrap())
                .await
        }
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = create_test_app();

        assert_eq!(app.get("/health/live").await.status(), StatusCode::OK);
        assert_eq!(app.get("/health/ready").await.status(), StatusCode::OK);

        let response = app.get("/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["backend"], "sqlite");
        assert_eq!(body["valuation"], "mock");
    }

    #[tokio::test]
    async fn test_waitlist_signup_and_list() {
        let app = create_test_app();

        let response = app
            .post_json(
                "/api/waitlist",
                json!({"name": "Ada", "email": " Ada@Example.com ", "userType": "landlord"}),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["entry"]["email"], "ada@example.com");

        let body = body_json(app.get("/api/waitlist").await).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["entries"][0]["name"], "Ada");
    }

    #[tokio::test]
    async fn test_waitlist_duplicate_is_conflict() {
        let app = create_test_app();

        let first = app
            .post_json("/api/waitlist", json!({"name": "Ada", "email": "ada@example.com"}), None)
            .await;
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app
            .post_json("/api/waitlist", json!({"name": "Ada L", "email": "ADA@example.com"}), None)
            .await;
        assert_eq!(second.status(), StatusCode::CONFLICT);
        let body = body_json(second).await;
        assert_eq!(body["error"]["code"], "CONFLICT");
        assert!(body["request_id"].is_string());

        let body = body_json(app.get("/api/waitlist").await).await;
        assert_eq!(body["count"], 1);
    }

    #[tokio::test]
    async fn test_waitlist_bad_requests() {
        let app = create_test_app();

        let response = app
            .post_json("/api/waitlist", json!({"name": "Ada"}), None)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .send(
                Request::builder()
                    .method("POST")
                    .uri("/api/waitlist")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_waitlist_export_csv() {
        let app = create_test_app();
        app.post_json("/api/waitlist", json!({"name": "Ada", "email": "ada@example.com"}), None)
            .await;

        let response = app.get("/api/waitlist/export").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");

        let text = body_text(response).await;
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Name,Email,Date"));
        assert!(lines.next().unwrap().starts_with("Ada,ada@example.com,"));
    }

    #[tokio::test]
    async fn test_scheduling_round_trip() {
        let app = create_test_app();

        let response = app
            .post_json(
                "/api/scheduling",
                json!({
                    "propertyId": "demo-1",
                    "serviceType": "maintenance",
                    "description": "HVAC service",
                    "participants": ["tenant@example.com", "+15551234567"],
                    "preferredTimeSlots": ["09:00-11:00"]
                }),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        let request_id = body["requestId"].as_str().unwrap().to_string();

        let body = body_json(
            app.get(&format!("/api/scheduling?requestId={}", request_id))
                .await,
        )
        .await;
        assert_eq!(body["schedulingRequest"]["status"], "pending");
        assert_eq!(body["schedulingRequest"]["priority"], "medium");

        let body = body_json(app.get("/api/scheduling?propertyId=demo-1").await).await;
        assert_eq!(body["schedulingRequests"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_scheduling_validation() {
        let app = create_test_app();

        let response = app
            .post_json(
                "/api/scheduling",
                json!({"propertyId": "demo-1", "serviceType": "repair", "participants": []}),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert_eq!(
            app.get("/api/scheduling").await.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            app.get("/api/scheduling?requestId=missing").await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_dashboard_requires_token() {
        let app = create_test_app();

        assert_eq!(
            app.get("/api/dashboard").await.status(),
            StatusCode::UNAUTHORIZED
        );

        let response = app
            .send(
                Request::builder()
                    .uri("/api/dashboard")
                    .header(header::AUTHORIZATION, "Bearer not-a-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_dashboard_metrics() {
        let app = create_test_app();

        let response = app.get_authed("/api/dashboard").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;

        assert_eq!(body["properties"].as_array().unwrap().len(), 4);
        assert_eq!(body["tasks"].as_array().unwrap().len(), 4);
        assert_eq!(body["metrics"]["totalValue"], 1_730_000.0);
        assert_eq!(body["metrics"]["occupancyRate"], 75.0);
        assert_eq!(body["metrics"]["latePayments"], 1);
        assert_eq!(body["metrics"]["overduePayments"], 1);
        // Newest property first
        assert_eq!(body["properties"][0]["id"], "demo-1");
    }

    #[tokio::test]
    async fn test_dashboard_skips_unvalued_properties() {
        let app = create_test_app();

        let vacant_lot = Property::new(DEMO_LANDLORD_ID, "5 Cedar Ct", "Downtown", "CA", "90001");
        app.store.insert_property(&vacant_lot).unwrap();
        app.store
            .insert_tenant(&crate::store::Tenant::new(&vacant_lot.id, "Eve", "Fox", 1_900.0))
            .unwrap();

        let body = body_json(app.get_authed("/api/dashboard").await).await;

        let properties = body["properties"].as_array().unwrap();
        assert_eq!(properties.len(), 4);
        assert!(properties.iter().all(|p| p["id"] != vacant_lot.id.as_str()));
        assert_eq!(body["metrics"]["occupancyRate"], 75.0);
        assert_eq!(body["metrics"]["totalValue"], 1_730_000.0);
    }

    #[tokio::test]
    async fn test_manual_value_upsert_is_idempotent_per_day() {
        let app = create_test_app();

        for value in [json!(500000), json!("510000")] {
            let response = app
                .post_json(
                    "/api/properties/values",
                    json!({"propertyId": "demo-2", "value": value}),
                    Some(&app.token),
                )
                .await;
            assert_eq!(response.status(), StatusCode::OK);
            let body = body_json(response).await;
            assert_eq!(body["source"], "landlord");
            assert_eq!(body["confidence"], 1.0);
        }

        let body = body_json(app.get_authed("/api/properties/values?propertyId=demo-2").await).await;
        let values = body["values"].as_array().unwrap();
        // The seeded row plus one manual row for today
        assert_eq!(values.len(), 2);
        assert_eq!(values[0]["value_amount"], 510_000.0);
        assert_eq!(body["property"]["address"], "456 Oak Ave");
    }

    #[tokio::test]
    async fn test_zillow_value_falls_back_to_mock() {
        let app = create_test_app();

        let response = app
            .post_json(
                "/api/properties/values",
                json!({"propertyId": "demo-1", "useZillow": true}),
                Some(&app.token),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;

        assert_eq!(body["source"], "zillow_mock");
        assert_eq!(body["propertyValue"]["value_type"], "zillow");
        // Mock value of the street line "123 Main St"
        assert_eq!(body["propertyValue"]["value_amount"], 561_946.0);
    }

    #[tokio::test]
    async fn test_property_values_ownership_and_validation() {
        let app = create_test_app();

        let stranger = Property::new("someone-else", "1 Far Rd", "Elsewhere", "NY", "10001");
        app.store.insert_property(&stranger).unwrap();

        let response = app
            .get_authed(&format!("/api/properties/values?propertyId={}", stranger.id))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.get_authed("/api/properties/values").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .post_json(
                "/api/properties/values",
                json!({"propertyId": "demo-1", "value": 0}),
                Some(&app.token),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rent_estimate() {
        let app = create_test_app();

        let response = app
            .get_authed("/api/properties/rent-estimate?propertyId=demo-3")
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["source"], "zillow_rent_mock");
        assert_eq!(body["propertyId"], "demo-3");
    }

    #[tokio::test]
    async fn test_valuation_estimate() {
        let app = create_test_app();

        let address = json!({
            "address": "742 Evergreen Terrace",
            "city": "Springfield",
            "state": "OR",
            "zipCode": "97477"
        });
        let first = body_json(app.post_json("/api/valuations/estimate", address.clone(), None).await).await;
        let second = body_json(app.post_json("/api/valuations/estimate", address, None).await).await;

        assert_eq!(first["value"], second["value"]);
        assert_eq!(first["source"], "zillow_mock");
        assert!(first["lastUpdated"].is_string());

        let response = app
            .post_json("/api/valuations/estimate", json!({"address": "742 Evergreen Terrace"}), None)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_pages_render() {
        let app = create_test_app();

        for uri in ["/", "/waitlist", "/scheduling", "/demo", "/admin/waitlist"] {
            let response = app.get(uri).await;
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
            let html = body_text(response).await;
            assert!(html.starts_with("<!DOCTYPE html>"), "{}", uri);
        }
    }
}
