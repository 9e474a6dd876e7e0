//! State-layer configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TIFFIN_API_ENDPOINT` - GraphQL endpoint of the ordering backend
//!
//! ## Optional
//! - `TIFFIN_API_VERSION` - API version tag (default: v1)
//! - `TIFFIN_ANALYTICS_ENDPOINT` - Analytics event API base URL
//! - `TIFFIN_ANALYTICS_API_KEY` - Analytics API key (required when the
//!   endpoint is set)

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// State-layer configuration.
#[derive(Debug, Clone)]
pub struct StateConfig {
    /// Ordering-backend API configuration.
    pub api: ApiConfig,
    /// Analytics sink configuration; `None` disables analytics entirely.
    pub analytics: Option<AnalyticsConfig>,
}

/// Ordering-backend API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// GraphQL endpoint URL.
    pub endpoint: String,
    /// API version tag (diagnostic, sent by collaborators that need it).
    pub api_version: String,
}

/// Analytics sink configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct AnalyticsConfig {
    /// Analytics event API base URL.
    pub endpoint: String,
    /// Analytics API key.
    pub api_key: SecretString,
}

impl std::fmt::Debug for AnalyticsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl StateConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, or if the
    /// analytics endpoint is set without an API key.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api = ApiConfig {
            endpoint: get_required_env("TIFFIN_API_ENDPOINT")?,
            api_version: get_env_or_default("TIFFIN_API_VERSION", "v1"),
        };

        let analytics = match get_optional_env("TIFFIN_ANALYTICS_ENDPOINT") {
            Some(endpoint) => {
                let api_key = get_optional_env("TIFFIN_ANALYTICS_API_KEY").ok_or_else(|| {
                    ConfigError::InvalidEnvVar(
                        "TIFFIN_ANALYTICS_ENDPOINT".to_string(),
                        "set without TIFFIN_ANALYTICS_API_KEY".to_string(),
                    )
                })?;
                Some(AnalyticsConfig {
                    endpoint,
                    api_key: SecretString::from(api_key),
                })
            }
            None => None,
        };

        Ok(Self { api, analytics })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analytics_config_debug_redacts_key() {
        let config = AnalyticsConfig {
            endpoint: "https://analytics.example.com/v1".to_string(),
            api_key: SecretString::from("super_secret_key"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("analytics.example.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_key"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingEnvVar("TIFFIN_API_ENDPOINT".to_string());
        assert_eq!(
            err.to_string(),
            "Missing environment variable: TIFFIN_API_ENDPOINT"
        );
    }
}
