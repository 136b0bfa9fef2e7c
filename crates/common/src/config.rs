//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{Error, Result};

/// Log output format for the console binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(Error::Configuration(format!(
                "Unknown LOG_FORMAT: {}. Supported formats: pretty, json",
                other
            ))),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Management API base URL, e.g. `https://apim.example.com/management`
    pub management_api_url: String,

    /// Organization and environment the console operates in
    pub organization_id: String,
    pub environment_id: String,

    /// Optional bearer token sent with every management API call
    pub api_token: Option<String>,

    /// Management API provider (http, mock)
    pub provider: String,

    /// Runtime configuration
    pub log_format: LogFormat,
    pub rust_log: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("management_api_url", &self.management_api_url)
            .field("organization_id", &self.organization_id)
            .field("environment_id", &self.environment_id)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("provider", &self.provider)
            .field("log_format", &self.log_format)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let provider = env::var("MANAGEMENT_PROVIDER").unwrap_or_else(|_| "http".to_string());

        let management_api_url = match env::var("MANAGEMENT_API_URL") {
            Ok(url) => url,
            Err(_) if provider == "mock" => String::new(),
            Err(_) => {
                return Err(Error::Configuration(
                    "MANAGEMENT_API_URL is required".to_string(),
                ))
            }
        };

        let log_format = match env::var("LOG_FORMAT") {
            Ok(value) => value.parse()?,
            Err(_) => LogFormat::default(),
        };

        let config = Self {
            management_api_url,
            organization_id: env::var("MANAGEMENT_ORGANIZATION_ID")
                .unwrap_or_else(|_| "DEFAULT".to_string()),
            environment_id: env::var("MANAGEMENT_ENVIRONMENT_ID")
                .unwrap_or_else(|_| "DEFAULT".to_string()),
            api_token: env::var("MANAGEMENT_API_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
            provider,
            log_format,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "apim=info".to_string()),
        };

        tracing::debug!(config = ?config, "Configuration loaded");
        Ok(config)
    }
}
