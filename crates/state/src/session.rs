//! Session provider.
//!
//! Holds the current auth token and mirrors it to persistent storage under
//! [`keys::TOKEN`]. No token-format validation happens here; validity is
//! whatever the profile query says.

use secrecy::{ExposeSecret, SecretString};
use tracing::{instrument, warn};

use crate::error::Result;
use crate::storage::{KeyValueStore, keys};

/// Provider of the current auth credential.
pub struct SessionProvider<S> {
    store: S,
    token: Option<SecretString>,
}

impl<S> std::fmt::Debug for SessionProvider<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionProvider")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl<S: KeyValueStore> SessionProvider<S> {
    /// Rehydrate the token from persistent storage.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the read fails; an absent key means
    /// logged out.
    pub async fn load(store: S) -> Result<Self> {
        let token = store.get(keys::TOKEN).await?.map(SecretString::from);
        Ok(Self { store, token })
    }

    /// The current token, if any.
    #[must_use]
    pub const fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    /// Whether a token is present. Presence alone does not imply a valid
    /// session; see the profile fetcher.
    #[must_use]
    pub const fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Install a new token, persisting it. Memory is updated first; a
    /// failed write is logged and does not undo the in-memory token.
    #[instrument(skip_all)]
    pub async fn set_token(&mut self, token: SecretString) {
        if let Err(e) = self.store.set(keys::TOKEN, token.expose_secret()).await {
            warn!(error = %e, "Failed to persist auth token");
        }
        self.token = Some(token);
    }

    /// Clear the token from storage and memory (logout). Best-effort: a
    /// failed delete is logged and the in-memory token is cleared anyway.
    #[instrument(skip(self))]
    pub async fn clear_token(&mut self) {
        if let Err(e) = self.store.remove(keys::TOKEN).await {
            warn!(error = %e, "Failed to delete persisted auth token");
        }
        self.token = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_token_round_trip_and_clear() {
        let store = MemoryStore::new();
        let mut session = SessionProvider::load(store.clone()).await.unwrap();
        assert!(!session.has_token());

        session.set_token(SecretString::from("tok-123")).await;
        assert!(session.has_token());
        assert_eq!(store.raw(keys::TOKEN).await.as_deref(), Some("tok-123"));

        // A fresh provider over the same store sees the persisted token
        let rehydrated = SessionProvider::load(store.clone()).await.unwrap();
        assert_eq!(
            rehydrated.token().map(|t| t.expose_secret().to_string()),
            Some("tok-123".to_string())
        );

        session.clear_token().await;
        assert!(!session.has_token());
        assert!(store.raw(keys::TOKEN).await.is_none());
    }

    #[tokio::test]
    async fn test_clear_when_already_logged_out() {
        let mut session = SessionProvider::load(MemoryStore::new()).await.unwrap();
        session.clear_token().await;
        assert!(!session.has_token());
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = SessionProvider {
            store: MemoryStore::new(),
            token: Some(SecretString::from("super-secret")),
        };
        let debug = format!("{session:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
