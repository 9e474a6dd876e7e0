//! Profile fetcher.
//!
//! Issues a network-only profile query whenever a token is present and
//! exposes the observable `called`/`loading`/`error`/`data` state the UI
//! layer binds to. Side effects on a successful fetch (analytics) are not
//! performed here: the fetcher emits a [`SessionEvent`] that observers
//! subscribe to, keeping the core free of direct side-effect calls.

use secrecy::SecretString;
use tokio::sync::broadcast;
use tracing::{instrument, warn};

use crate::api::{ApiClient, Profile};
use crate::cache::ResponseCache;

/// Events emitted by the session layer for observers (analytics, UI).
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A profile fetch completed successfully.
    ProfileLoaded(Profile),
}

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Observable profile fetch state machine.
pub struct ProfileFetcher {
    client: ApiClient,
    cache: ResponseCache,
    events: broadcast::Sender<SessionEvent>,
    called: bool,
    loading: bool,
    error: Option<String>,
    data: Option<Profile>,
}

impl ProfileFetcher {
    /// Create a fetcher that caches successful responses in `cache`.
    #[must_use]
    pub fn new(client: ApiClient, cache: ResponseCache) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            client,
            cache,
            events,
            called: false,
            loading: false,
            error: None,
            data: None,
        }
    }

    /// Subscribe to session events. Receivers that lag are skipped, never
    /// blocked on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Whether a fetch has ever been issued.
    #[must_use]
    pub const fn called(&self) -> bool {
        self.called
    }

    /// Whether a fetch is currently in flight.
    #[must_use]
    pub const fn loading(&self) -> bool {
        self.loading
    }

    /// The last fetch error, if the most recent fetch failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The fetched profile, if a fetch has succeeded.
    #[must_use]
    pub const fn data(&self) -> Option<&Profile> {
        self.data.as_ref()
    }

    /// Fetch the profile for `token`. Skipped entirely (no state change)
    /// when no token is present.
    ///
    /// Always network-only: the response cache is written on success but
    /// never read. A failed fetch records the error for observation and
    /// neither retries nor touches the token - a failed profile fetch is
    /// not a logout trigger.
    #[instrument(skip_all)]
    pub async fn fetch(&mut self, token: Option<&SecretString>) -> Option<Profile> {
        let Some(token) = token else {
            return None;
        };

        self.called = true;
        self.loading = true;
        let result = self.client.fetch_profile(token).await;
        self.loading = false;

        match result {
            Ok(profile) => {
                self.error = None;
                self.data = Some(profile.clone());
                self.cache.insert_profile(&profile).await;
                // No subscribers is fine; side effects never gate the fetch
                let _ = self.events.send(SessionEvent::ProfileLoaded(profile.clone()));
                Some(profile)
            }
            Err(e) => {
                warn!(error = %e, "Profile fetch failed");
                self.error = Some(e.to_string());
                None
            }
        }
    }

    /// Manually re-issue the profile query (same semantics as [`fetch`]).
    ///
    /// [`fetch`]: Self::fetch
    pub async fn refetch(&mut self, token: Option<&SecretString>) -> Option<Profile> {
        self.fetch(token).await
    }

    /// Drop all fetch state so logged-out views cannot observe stale
    /// logged-in data. Part of the logout cache reset.
    pub fn reset(&mut self) {
        self.called = false;
        self.loading = false;
        self.error = None;
        self.data = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;

    fn fetcher() -> ProfileFetcher {
        let client = ApiClient::new(&ApiConfig {
            endpoint: "http://localhost:0/graphql".to_string(),
            api_version: "v1".to_string(),
        });
        ProfileFetcher::new(client, ResponseCache::new())
    }

    #[tokio::test]
    async fn test_fetch_without_token_is_skipped() {
        let mut fetcher = fetcher();
        let result = fetcher.fetch(None).await;
        assert!(result.is_none());
        assert!(!fetcher.called());
        assert!(fetcher.error().is_none());
        assert!(fetcher.data().is_none());
    }

    #[tokio::test]
    async fn test_failed_fetch_records_error_only() {
        let mut fetcher = fetcher();
        // Nothing listens on port 0; the request fails at the transport
        let result = fetcher.fetch(Some(&SecretString::from("tok"))).await;
        assert!(result.is_none());
        assert!(fetcher.called());
        assert!(!fetcher.loading());
        assert!(fetcher.error().is_some());
        assert!(fetcher.data().is_none());
    }

    #[tokio::test]
    async fn test_reset_drops_observable_state() {
        let mut fetcher = fetcher();
        fetcher.fetch(Some(&SecretString::from("tok"))).await;
        fetcher.reset();
        assert!(!fetcher.called());
        assert!(fetcher.error().is_none());
        assert!(fetcher.data().is_none());
    }
}
