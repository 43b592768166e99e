//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup; a `.env` file is honoured for local
//! development.

use std::env;
use std::path::PathBuf;

/// Default eco/speed balance when a plan request gives neither a balance nor
/// a preference.
const DEFAULT_ECO_BALANCE: f64 = 80.0;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL (CORS origin)
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// JSON file replacing the built-in route menu
    pub route_menu_path: Option<PathBuf>,
    pub default_eco_balance: f64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_eco_balance = match var("DEFAULT_ECO_BALANCE") {
            Some(raw) => {
                let value: f64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid("DEFAULT_ECO_BALANCE", raw.clone()))?;
                if !(0.0..=100.0).contains(&value) {
                    return Err(ConfigError::Invalid("DEFAULT_ECO_BALANCE", raw));
                }
                value
            }
            None => DEFAULT_ECO_BALANCE,
        };

        Ok(Self {
            frontend_url: var("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
            gcp_project_id: var("GCP_PROJECT_ID").unwrap_or_else(|| "local-dev".to_string()),
            port: var("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: var("JWT_SIGNING_KEY")
                .ok_or(ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            route_menu_path: var("ROUTE_MENU_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            default_eco_balance,
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            route_menu_path: None,
            default_eco_balance: DEFAULT_ECO_BALANCE,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
