//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `REFECTORY_API_URL` - Base URL of the campus backend API
//!   (default: `http://localhost:8080`)
//! - `REFECTORY_DATA_DIR` - Directory for persisted client state
//!   (default: `refectory` under the platform's local data directory)
//! - `REFECTORY_CURRENCY` - Currency symbol used when rendering prices
//!   (default: `£`)
//! - `PAYPAL_CLIENT_ID` - PayPal client id, shown when prompting for payment
//!   approval (display only; the capture itself runs through the backend)

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Ordering client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the campus backend API.
    pub api_base_url: Url,
    /// Directory holding the persisted client state document.
    pub data_dir: PathBuf,
    /// Currency symbol for price rendering.
    pub currency_symbol: String,
    /// PayPal client id, if configured.
    pub paypal_client_id: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `REFECTORY_API_URL` is set but not a valid
    /// URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_env_or_default("REFECTORY_API_URL", "http://localhost:8080")
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("REFECTORY_API_URL".to_owned(), e.to_string())
            })?;
        let data_dir =
            std::env::var("REFECTORY_DATA_DIR").map_or_else(|_| default_data_dir(), PathBuf::from);
        let currency_symbol = get_env_or_default("REFECTORY_CURRENCY", "£");
        let paypal_client_id = get_optional_env("PAYPAL_CLIENT_ID");

        Ok(Self {
            api_base_url,
            data_dir,
            currency_symbol,
            paypal_client_id,
        })
    }
}

/// Platform-appropriate default for persisted client state.
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("refectory")
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}
