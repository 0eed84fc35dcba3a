//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local development. Everything except the
//! JWT signing key and the remote offers URL has a default.

use std::env;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

/// Which backend persists offers and users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Google Cloud Firestore (or its emulator).
    Firestore,
    /// In-process maps; data is lost on restart.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("OFFER_STORE")),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Server ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,

    // --- Storage ---
    pub offer_store: StoreBackend,
    /// GCP project ID (Firestore backend only)
    pub gcp_project_id: String,

    // --- Remote offers source ---
    /// Base URL of the remote source; offers are read from `{url}/offers`
    pub offers_http_url: String,
    pub offers_http_connect_timeout: Duration,
    /// Upper bound for a whole fetch request, body included
    pub offers_http_request_timeout: Duration,
    /// Delay between two scheduled fetch cycles
    pub offers_fetch_interval: Duration,
    pub scheduler_enabled: bool,

    // --- Auth ---
    /// JWT signing key for bearer tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    pub jwt_issuer: String,
    pub jwt_expiration_days: u64,
    /// PBKDF2 rounds for newly hashed passwords
    pub password_hash_iterations: NonZeroU32,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            offer_store: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            offers_http_url: "http://127.0.0.1:5057".to_string(),
            offers_http_connect_timeout: Duration::from_millis(1000),
            offers_http_request_timeout: Duration::from_millis(1000),
            offers_fetch_interval: Duration::from_secs(3 * 60 * 60),
            scheduler_enabled: false,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            jwt_issuer: "job-offers-backend".to_string(),
            jwt_expiration_days: 30,
            // Cheap hashing keeps auth tests fast.
            password_hash_iterations: NonZeroU32::MIN.saturating_add(999),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: parse_var("PORT", "8080")?,

            offer_store: parse_var("OFFER_STORE", "firestore")?,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),

            offers_http_url: env::var("OFFERS_HTTP_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("OFFERS_HTTP_URL"))?,
            offers_http_connect_timeout: Duration::from_millis(parse_var(
                "OFFERS_HTTP_CONNECT_TIMEOUT_MS",
                "1000",
            )?),
            offers_http_request_timeout: Duration::from_millis(parse_var(
                "OFFERS_HTTP_REQUEST_TIMEOUT_MS",
                "1000",
            )?),
            // tokio intervals reject a zero period
            offers_fetch_interval: Duration::from_secs(
                parse_var::<u64>("OFFERS_FETCH_INTERVAL_SECS", "10800")?.max(1),
            ),
            scheduler_enabled: parse_var("SCHEDULER_ENABLED", "true")?,

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            jwt_issuer: env::var("JWT_ISSUER")
                .unwrap_or_else(|_| "job-offers-backend".to_string()),
            jwt_expiration_days: parse_var("JWT_EXPIRATION_DAYS", "30")?,
            password_hash_iterations: parse_var("PASSWORD_HASH_ITERATIONS", "100000")?,
        })
    }
}

/// Read `name` from the environment, falling back to `default`, and parse it.
fn parse_var<T: FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.trim().parse().map_err(|_| ConfigError::Invalid(name))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
