//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `GUSTAVO_*` environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::store::{Datastore, RestStore, RestStoreConfig, SqliteStore, StoreError, StoreResult};
use crate::valuation::{ValuationError, ValuationService, ZillowClient, ZillowConfig};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub valuation: ValuationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Empty means any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_body_limit")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_body_limit() -> usize {
    64 * 1024 // 64 KB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
            max_body_bytes: default_body_limit(),
        }
    }
}

/// Which datastore backend serves the tables
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatastoreBackend {
    #[default]
    Sqlite,
    Rest,
}

impl std::str::FromStr for DatastoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(DatastoreBackend::Sqlite),
            "rest" => Ok(DatastoreBackend::Rest),
            _ => Err(format!("Invalid datastore backend: {}. Use sqlite or rest", s)),
        }
    }
}

/// Datastore configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: DatastoreBackend,

    /// SQLite database file
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Hosted service URL (rest backend)
    #[serde(default)]
    pub url: String,

    /// Hosted service key (rest backend)
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_db_timeout")]
    pub request_timeout_ms: u64,
}

fn default_db_path() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("gustavo").join("gustavo.db").to_string_lossy().to_string())
        .unwrap_or_else(|| "./gustavo.db".to_string())
}

fn default_db_timeout() -> u64 {
    10_000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatastoreBackend::default(),
            path: default_db_path(),
            url: String::new(),
            api_key: String::new(),
            request_timeout_ms: default_db_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// Open the configured backend
    pub fn open(&self) -> StoreResult<Arc<dyn Datastore>> {
        match self.backend {
            DatastoreBackend::Sqlite => Ok(Arc::new(SqliteStore::open(&self.path)?)),
            DatastoreBackend::Rest => {
                if self.api_key.is_empty() {
                    return Err(StoreError::Config(
                        "database.api_key is required for the rest backend".to_string(),
                    ));
                }
                Ok(Arc::new(RestStore::new(RestStoreConfig {
                    base_url: self.url.clone(),
                    api_key: self.api_key.clone(),
                    request_timeout_ms: self.request_timeout_ms,
                })?))
            }
        }
    }
}

/// Property valuation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ValuationConfig {
    /// Provider key; without it every estimate is mocked
    #[serde(default)]
    pub zillow_api_key: Option<String>,

    #[serde(default = "default_zillow_url")]
    pub zillow_base_url: String,

    /// Use the mock generator when the provider has no estimate
    #[serde(default = "default_mock_fallback")]
    pub mock_fallback: bool,

    #[serde(default = "default_valuation_timeout")]
    pub request_timeout_ms: u64,
}

fn default_zillow_url() -> String {
    ZillowConfig::default().base_url
}

fn default_mock_fallback() -> bool {
    true
}

fn default_valuation_timeout() -> u64 {
    5000
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            zillow_api_key: None,
            zillow_base_url: default_zillow_url(),
            mock_fallback: default_mock_fallback(),
            request_timeout_ms: default_valuation_timeout(),
        }
    }
}

impl ValuationConfig {
    /// Build the valuation service
    pub fn service(&self) -> Result<ValuationService, ValuationError> {
        let zillow = ZillowClient::new(ZillowConfig {
            api_key: self.zillow_api_key.clone(),
            base_url: self.zillow_base_url.clone(),
            request_timeout_ms: self.request_timeout_ms,
        })?;
        Ok(ValuationService::new(zillow, self.mock_fallback))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("gustavo").join("config.toml")),
            Some(PathBuf::from("/etc/gustavo/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Server overrides
        if let Some(host) = var("GUSTAVO_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("GUSTAVO_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }

        // Database overrides
        if let Some(backend) = var("GUSTAVO_DB_BACKEND") {
            match backend.parse() {
                Ok(b) => self.database.backend = b,
                Err(e) => tracing::warn!("Ignoring GUSTAVO_DB_BACKEND: {}", e),
            }
        }
        if let Some(path) = var("GUSTAVO_DB_PATH") {
            self.database.path = path;
        }
        if let Some(url) = var("GUSTAVO_DB_URL") {
            self.database.url = url;
        }
        if let Some(key) = var("GUSTAVO_DB_API_KEY") {
            self.database.api_key = key;
        }

        // Valuation overrides
        if let Some(key) = var("GUSTAVO_ZILLOW_API_KEY").or_else(|| var("ZILLOW_API_KEY")) {
            self.valuation.zillow_api_key = Some(key);
        }
        if let Some(fallback) = var("GUSTAVO_MOCK_FALLBACK").and_then(|v| v.parse().ok()) {
            self.valuation.mock_fallback = fallback;
        }

        // Logging overrides
        if let Some(level) = var("GUSTAVO_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("GUSTAVO_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Gustavo Configuration
#
# Environment variables override these settings:
# - GUSTAVO_HOST
# - GUSTAVO_PORT
# - GUSTAVO_DB_BACKEND
# - GUSTAVO_DB_PATH
# - GUSTAVO_DB_URL
# - GUSTAVO_DB_API_KEY
# - GUSTAVO_ZILLOW_API_KEY (or ZILLOW_API_KEY)
# - GUSTAVO_MOCK_FALLBACK
# - GUSTAVO_LOG_LEVEL
# - GUSTAVO_LOG_FORMAT

[server]
# Server host
host = "0.0.0.0"

# Server port
port = 3000

# Allowed CORS origins (empty allows any origin)
cors_origins = []

# Request timeout in seconds
request_timeout_secs = 30

# Maximum JSON body size (bytes)
max_body_bytes = 65536

[database]
# Backend: sqlite (embedded file) or rest (hosted service)
backend = "sqlite"

# SQLite database file
path = "~/.local/share/gustavo/gustavo.db"

# Hosted service URL and key (rest backend only)
url = ""
api_key = ""

# Hosted service request timeout (ms)
request_timeout_ms = 10000

[valuation]
# Zillow API key; leave unset to always use mock valuations
# zillow_api_key = ""

# Provider base URL
zillow_base_url = "https://api.bridgedataoutput.com/api/v2"

# Fall back to mock valuations when the provider has no estimate
mock_fallback = true

# Provider request timeout (ms)
request_timeout_ms = 5000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/gustavo/gustavo.log"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.backend, DatastoreBackend::Sqlite);
        assert!(config.valuation.mock_fallback);
        assert_eq!(config.valuation.zillow_api_key, None);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [database]
            backend = "rest"
            url = "https://demo.example.co"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.backend, DatastoreBackend::Rest);
        assert_eq!(config.database.request_timeout_ms, 10_000);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GUSTAVO_PORT", "8080"),
            ("GUSTAVO_DB_BACKEND", "REST"),
            ("ZILLOW_API_KEY", "zk"),
            ("GUSTAVO_MOCK_FALLBACK", "false"),
            ("GUSTAVO_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.backend, DatastoreBackend::Rest);
        assert_eq!(config.valuation.zillow_api_key.as_deref(), Some("zk"));
        assert!(!config.valuation.mock_fallback);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_invalid_overrides_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|k| match k {
            "GUSTAVO_PORT" => Some("not-a-port".to_string()),
            "GUSTAVO_DB_BACKEND" => Some("mongo".to_string()),
            _ => None,
        });

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.backend, DatastoreBackend::Sqlite);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/gustavo.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_open_sqlite_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("g.db").to_string_lossy().to_string(),
            ..Default::default()
        };

        let store = config.open().unwrap();
        assert_eq!(store.backend(), "sqlite");
    }

    #[test]
    fn test_rest_backend_requires_key() {
        let config = DatabaseConfig {
            backend: DatastoreBackend::Rest,
            url: "https://demo.example.co".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.open(), Err(StoreError::Config(_))));
    }
}
