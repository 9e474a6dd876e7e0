//! Ordering-backend GraphQL API client.
//!
//! Hand-written request/response envelopes over `reqwest` - the profile
//! query is small enough that codegen buys nothing. The auth token travels
//! in the `Authorization` header (transport-level), never in the body.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::instrument;

use tiffin_core::UserId;

use crate::config::ApiConfig;

/// Errors that can occur when talking to the ordering backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status.
    #[error("API returned status {0}")]
    Status(u16),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {0}")]
    GraphQL(String),

    /// Response carried neither data nor errors.
    #[error("No data in response")]
    MissingData,
}

// ─────────────────────────────────────────────────────────────────────────────
// GraphQL envelope
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GraphQLRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
}

impl<T> GraphQLResponse<T> {
    fn into_result(self) -> Result<T, ApiError> {
        if let Some(errors) = self.errors
            && !errors.is_empty()
        {
            let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
            return Err(ApiError::GraphQL(messages.join("; ")));
        }

        self.data.ok_or(ApiError::MissingData)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Profile
// ─────────────────────────────────────────────────────────────────────────────

/// The authenticated user's profile as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Backend-issued user id.
    #[serde(rename = "_id")]
    pub id: UserId,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone number.
    #[serde(default)]
    pub phone: Option<String>,
}

const PROFILE_QUERY: &str = r"
query Profile {
  profile {
    _id
    name
    email
    phone
  }
}
";

#[derive(Debug, Deserialize)]
struct ProfileData {
    profile: Option<Profile>,
}

// ─────────────────────────────────────────────────────────────────────────────
// ApiClient
// ─────────────────────────────────────────────────────────────────────────────

/// Client for the ordering-backend GraphQL API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    endpoint: String,
    api_version: String,
}

impl ApiClient {
    /// Create a new API client.
    #[must_use]
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                client: reqwest::Client::new(),
                endpoint: config.endpoint.clone(),
                api_version: config.api_version.clone(),
            }),
        }
    }

    /// Execute a GraphQL query, attaching `token` as a bearer credential
    /// when present.
    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Option<serde_json::Value>,
        token: Option<&SecretString>,
    ) -> Result<T, ApiError> {
        let body = GraphQLRequest { query, variables };

        let mut request = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header("X-Api-Version", &self.inner.api_version)
            .json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let parsed: GraphQLResponse<T> = response.json().await?;
        parsed.into_result()
    }

    /// Fetch the profile of the user identified by `token`.
    ///
    /// Always network-only: this call never consults a response cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the backend reports GraphQL
    /// errors, or the response carries no profile.
    #[instrument(skip(self, token))]
    pub async fn fetch_profile(&self, token: &SecretString) -> Result<Profile, ApiError> {
        let data: ProfileData = self.execute(PROFILE_QUERY, None, Some(token)).await?;
        data.profile.ok_or(ApiError::MissingData)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_errors_are_joined() {
        let response: GraphQLResponse<ProfileData> = serde_json::from_str(
            r#"{"errors":[{"message":"unauthenticated"},{"message":"token expired"}]}"#,
        )
        .unwrap();
        let err = response.into_result().unwrap_err();
        assert_eq!(
            err.to_string(),
            "GraphQL errors: unauthenticated; token expired"
        );
    }

    #[test]
    fn test_missing_data_is_reported() {
        let response: GraphQLResponse<ProfileData> = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            response.into_result().unwrap_err(),
            ApiError::MissingData
        ));
    }

    #[test]
    fn test_profile_deserializes_backend_shape() {
        let profile: Profile = serde_json::from_str(
            r#"{"_id":"u-7","name":"Asha","email":"asha@example.com","phone":"+4912345"}"#,
        )
        .unwrap();
        assert_eq!(profile.id, UserId::new("u-7"));
        assert_eq!(profile.name.as_deref(), Some("Asha"));

        // Fields the query did not select are tolerated as absent
        let sparse: Profile = serde_json::from_str(r#"{"_id":"u-8"}"#).unwrap();
        assert!(sparse.email.is_none());
    }
}
