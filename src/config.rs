//! Application configuration loaded from environment variables.
//!
//! The library is embedded in a UI shell; configuration is read once at
//! startup and handed to the stores by the host.

use std::env;
use std::path::PathBuf;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory for the device-local cache store
    pub data_dir: PathBuf,
    /// GCP project ID for the remote state store
    pub gcp_project_id: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            gcp_project_id: "test-project".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// For local development, set `FIRESTORE_EMULATOR_HOST` to run against
    /// the Firestore emulator instead of a real project.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            data_dir: env::var("HABITFORGE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
