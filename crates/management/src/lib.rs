//! APIM Management API collaborator
//!
//! Provides the `ManagementApi` implementations the console runs against:
//! - HTTP client for a live management API
//! - In-memory mock for tests and offline use
//! - Configurable base URL, organization, environment and bearer token

pub mod client;
pub mod mock;

use apim_common::{Config, Error, Result};
use apim_groups::ManagementApi;

/// Management API client configuration.
#[derive(Clone)]
pub struct ManagementConfig {
    /// Provider (http, mock)
    pub provider: String,
    /// Base URL of the management API, without organization segment
    pub base_url: String,
    pub organization_id: String,
    pub environment_id: String,
    /// Bearer token sent with every request
    pub api_token: Option<String>,
}

impl std::fmt::Debug for ManagementConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagementConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("organization_id", &self.organization_id)
            .field("environment_id", &self.environment_id)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ManagementConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            provider: config.provider.clone(),
            base_url: config.management_api_url.clone(),
            organization_id: config.organization_id.clone(),
            environment_id: config.environment_id.clone(),
            api_token: config.api_token.clone(),
        }
    }

    /// Create management config from environment variables.
    pub fn from_env() -> Result<Self> {
        Config::from_env().map(|config| Self::from_config(&config))
    }

    /// `{base}/organizations/{org}`
    pub fn organization_url(&self) -> String {
        format!(
            "{}/organizations/{}",
            self.base_url.trim_end_matches('/'),
            self.organization_id
        )
    }

    /// `{base}/organizations/{org}/environments/{env}`
    pub fn environment_url(&self) -> String {
        format!(
            "{}/environments/{}",
            self.organization_url(),
            self.environment_id
        )
    }
}

/// Factory for creating ManagementApi implementations.
pub struct ManagementApiFactory;

impl ManagementApiFactory {
    /// Create a ManagementApi based on configuration.
    pub fn create(config: ManagementConfig) -> Result<Box<dyn ManagementApi>> {
        match config.provider.as_str() {
            "http" => {
                tracing::info!(base_url = %config.base_url, "Creating management API client");
                if config.base_url.is_empty() {
                    return Err(Error::Configuration(
                        "MANAGEMENT_API_URL is required for http provider".to_string(),
                    ));
                }
                Ok(Box::new(client::HttpManagementClient::new(config)?))
            }
            "mock" => {
                tracing::info!("Creating mock management API");
                Ok(Box::new(mock::MockManagementApi::with_demo_data()))
            }
            provider => Err(Error::Configuration(format!(
                "Unknown management provider: {}. Supported providers: http, mock",
                provider
            ))),
        }
    }
}
