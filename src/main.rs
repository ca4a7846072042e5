//! Gustavo API Server
//!
//! Run with: cargo run --bin gustavo
//!
//! # Configuration
//!
//! Read from the first `config.toml` found (see [`Config::load_default`]),
//! then overridden by environment variables:
//! - `GUSTAVO_HOST`, `GUSTAVO_PORT`: Bind address (default: 0.0.0.0:3000)
//! - `GUSTAVO_DB_BACKEND`: `sqlite` or `rest`
//! - `GUSTAVO_DB_PATH`: SQLite file
//! - `GUSTAVO_DB_URL`, `GUSTAVO_DB_API_KEY`: Hosted datastore
//! - `ZILLOW_API_KEY`: Enables live valuations
//! - `GUSTAVO_MOCK_FALLBACK`: Use mock valuations when Zillow has nothing
//! - `RUST_LOG`: Log filter, wins over `logging.level`

use gustavo::api::{serve, ApiConfig, AppState};
use gustavo::config::{Config, LoggingConfig};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_default();

    init_tracing(&config.logging)?;

    tracing::info!("Starting Gustavo API server v{}", env!("CARGO_PKG_VERSION"));

    // Open the datastore
    let store = config.database.open()?;
    tracing::info!(backend = store.backend(), "Datastore ready");

    // Valuation provider
    let valuation = config.valuation.service()?;
    if valuation.provider_configured() {
        tracing::info!("Zillow valuations enabled");
    } else {
        tracing::info!(
            mock_fallback = config.valuation.mock_fallback,
            "No Zillow API key configured, using mock valuations"
        );
    }

    let api_config = ApiConfig::from(config.server.clone());
    let state = AppState::new(store, valuation, api_config.clone());

    serve(state, &api_config).await?;

    Ok(())
}

/// Registry with an env filter and one fmt layer, pretty or JSON, to stdout or a file
fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "gustavo={level},tower_http={level}",
            level = logging.level
        ))
    });

    let json = logging.format.eq_ignore_ascii_case("json");

    let layer: BoxedLayer = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            if json {
                layer.json().boxed()
            } else {
                layer.boxed()
            }
        }
        None => {
            let layer = tracing_subscriber::fmt::layer();
            if json {
                layer.json().boxed()
            } else {
                layer.boxed()
            }
        }
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    Ok(())
}
