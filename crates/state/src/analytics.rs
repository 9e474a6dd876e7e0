//! Analytics sink and session-event observer.
//!
//! Fire-and-forget: every failure here is logged and swallowed. Analytics
//! must never block or fail the session operation it accompanies.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::json;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use tiffin_core::UserId;

use crate::config::AnalyticsConfig;
use crate::profile::SessionEvent;

/// Event emitted when a returning user's profile loads.
pub const USER_RECONNECTED: &str = "user_reconnected";

/// Errors that can occur when posting analytics events.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to build the client.
    #[error("Client error: {0}")]
    Client(String),
}

/// Client for the analytics event API.
#[derive(Clone)]
pub struct AnalyticsClient {
    inner: Arc<AnalyticsClientInner>,
}

struct AnalyticsClientInner {
    client: reqwest::Client,
    endpoint: String,
}

impl AnalyticsClient {
    /// Create a new analytics client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &AnalyticsConfig) -> Result<Self, AnalyticsError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| AnalyticsError::Client(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            inner: Arc::new(AnalyticsClientInner {
                client,
                endpoint: config.endpoint.clone(),
            }),
        })
    }

    /// Associate `attributes` with `user_id` in the analytics backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn identify(
        &self,
        user_id: &UserId,
        attributes: serde_json::Value,
    ) -> Result<(), AnalyticsError> {
        let body = json!({
            "userId": user_id,
            "traits": attributes,
        });
        self.post("identify", &body).await
    }

    /// Record a named event with an arbitrary payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn track(
        &self,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), AnalyticsError> {
        let body = json!({
            "event": event,
            "properties": payload,
        });
        self.post("track", &body).await
    }

    async fn post(&self, path: &str, body: &serde_json::Value) -> Result<(), AnalyticsError> {
        let url = format!("{}/{path}", self.inner.endpoint);
        let response = self.inner.client.post(&url).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AnalyticsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

/// Spawn a task observing session events and forwarding them to analytics.
///
/// On a profile load, identifies the user (denormalized name/email/phone
/// keyed by user id) and then tracks [`USER_RECONNECTED`]. The task ends
/// quietly when the event channel closes; a lagging receiver skips missed
/// events rather than stalling the emitter.
pub fn spawn_observer(
    client: AnalyticsClient,
    mut events: broadcast::Receiver<SessionEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::ProfileLoaded(profile)) => {
                    let attributes = json!({
                        "userId": &profile.id,
                        "name": &profile.name,
                        "email": &profile.email,
                        "phone": &profile.phone,
                    });
                    if let Err(e) = client.identify(&profile.id, attributes).await {
                        warn!(error = %e, "Analytics identify failed");
                    }
                    let payload = json!({ "userId": &profile.id });
                    if let Err(e) = client.track(USER_RECONNECTED, payload).await {
                        warn!(error = %e, "Analytics track failed");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Analytics observer lagged; skipping events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn test_client_builds_from_config() {
        let config = AnalyticsConfig {
            endpoint: "https://analytics.example.com/v1".to_string(),
            api_key: SecretString::from("k-3x8mPq"),
        };
        assert!(AnalyticsClient::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_observer_ends_when_channel_closes() {
        let config = AnalyticsConfig {
            endpoint: "http://localhost:0".to_string(),
            api_key: SecretString::from("k-3x8mPq"),
        };
        let client = AnalyticsClient::new(&config).unwrap();
        let (tx, rx) = broadcast::channel(4);
        let handle = spawn_observer(client, rx);
        drop(tx);
        handle.await.unwrap();
    }
}
