//! Client configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local development.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default interval between booking status polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the booking backend (e.g. `https://api.example.com/api`)
    pub api_base_url: String,
    /// Place search / reverse geocoding provider
    pub geocoder_base_url: String,
    /// Route provider
    pub router_base_url: String,
    /// Where the credential store is persisted
    pub credentials_path: PathBuf,
    /// How often a tracked booking is polled
    pub poll_interval: Duration,
    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let api_base_url = env::var("API_BASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .map_err(|_| ConfigError::Missing("API_BASE_URL"))?;

        Ok(Self {
            api_base_url,
            geocoder_base_url: env::var("GEOCODER_BASE_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),
            router_base_url: env::var("ROUTER_BASE_URL")
                .unwrap_or_else(|_| "https://router.project-osrm.org".to_string()),
            credentials_path: env::var("CREDENTIALS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".ride-booking/credentials.json")),
            poll_interval: Duration::from_secs(parse_secs(
                "POLL_INTERVAL_SECS",
                DEFAULT_POLL_INTERVAL_SECS,
            )?),
            request_timeout: Duration::from_secs(parse_secs(
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
        })
    }

    /// Config pointing at a local backend, for tests.
    pub fn test_default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api".to_string(),
            geocoder_base_url: "http://localhost:3001".to_string(),
            router_base_url: "http://localhost:3002".to_string(),
            credentials_path: PathBuf::from("test-credentials.json"),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            request_timeout: Duration::from_secs(5),
        }
    }
}

fn parse_secs(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(0) | Err(_) => Err(ConfigError::Invalid(name, raw)),
            Ok(secs) => Ok(secs),
        },
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
