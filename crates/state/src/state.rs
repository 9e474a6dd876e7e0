//! Session orchestrator.
//!
//! Composes the session provider, profile fetcher, cart manager, location
//! provider, and response cache into the single state object the UI layer
//! holds. Owns no data itself beyond the composition; each piece is owned
//! by its own module.

use tracing::instrument;

use crate::api::ApiClient;
use crate::cache::{PROFILE_TYPE, ResponseCache};
use crate::cart::CartManager;
use crate::error::Result;
use crate::location::LocationProvider;
use crate::profile::ProfileFetcher;
use crate::session::SessionProvider;
use crate::storage::KeyValueStore;

/// The composed user session state.
///
/// All operations run on one logical task; mutations go through `&mut self`
/// so the compiler enforces the single-writer model the design assumes.
pub struct UserState<S> {
    session: SessionProvider<S>,
    profile: ProfileFetcher,
    cart: CartManager<S>,
    location: LocationProvider,
    cache: ResponseCache,
}

impl<S: KeyValueStore + Clone> UserState<S> {
    /// Hydrate the full session state from persistent storage.
    ///
    /// # Errors
    ///
    /// Returns an error if storage reads fail or the persisted cart is
    /// malformed. Absent keys hydrate to a logged-out, empty state.
    pub async fn load(store: S, api: ApiClient) -> Result<Self> {
        let cache = ResponseCache::new();
        let session = SessionProvider::load(store.clone()).await?;
        let cart = CartManager::load(store).await?;
        let profile = ProfileFetcher::new(api, cache.clone());

        Ok(Self {
            session,
            profile,
            cart,
            location: LocationProvider::new(),
            cache,
        })
    }

    /// The cart manager.
    #[must_use]
    pub const fn cart(&self) -> &CartManager<S> {
        &self.cart
    }

    /// Mutable access to the cart manager.
    pub const fn cart_mut(&mut self) -> &mut CartManager<S> {
        &mut self.cart
    }

    /// The session provider.
    #[must_use]
    pub const fn session(&self) -> &SessionProvider<S> {
        &self.session
    }

    /// Mutable access to the session provider.
    pub const fn session_mut(&mut self) -> &mut SessionProvider<S> {
        &mut self.session
    }

    /// The profile fetcher (observable fetch state, event subscription).
    #[must_use]
    pub const fn profile_fetcher(&self) -> &ProfileFetcher {
        &self.profile
    }

    /// The location provider.
    #[must_use]
    pub const fn location(&self) -> &LocationProvider {
        &self.location
    }

    /// Mutable access to the location provider.
    pub const fn location_mut(&mut self) -> &mut LocationProvider {
        &mut self.location
    }

    /// The response cache.
    #[must_use]
    pub const fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// The fetched profile, if any.
    #[must_use]
    pub const fn profile(&self) -> Option<&crate::api::Profile> {
        self.profile.data()
    }

    /// True iff a token is present and a profile fetch has completed with a
    /// non-null profile.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.session.has_token() && self.profile.data().is_some()
    }

    /// Sum of cart line quantities.
    #[must_use]
    pub fn cart_count(&self) -> u32 {
        self.cart.count()
    }

    /// Fetch (or refetch) the profile with the current token. Skipped when
    /// logged out.
    pub async fn sync_profile(&mut self) {
        let token = self.session.token().cloned();
        self.profile.fetch(token.as_ref()).await;
    }

    /// Log the user out. Best-effort and idempotent: every step tolerates
    /// failure, and calling this twice leaves the same logged-out state.
    ///
    /// Steps, in order:
    /// 1. Delete the persisted token.
    /// 2. Clear the in-memory token (flips `is_logged_in`, future profile
    ///    fetches are skipped).
    /// 3. Downgrade a saved-address location to an unsaved one with the
    ///    same coordinates.
    /// 4. Evict the stale profile entry from the response cache.
    /// 5. Reset the response cache and the profile fetch state wholesale.
    #[instrument(skip(self))]
    pub async fn logout(&mut self) {
        // 1 + 2: persisted delete is logged-best-effort inside the provider
        self.session.clear_token().await;

        // 3: saved address must not survive into the next session
        let saved = self
            .location
            .current()
            .filter(|location| location.is_saved_address())
            .cloned();
        if let Some(location) = saved {
            self.location.set(location.into_unsaved());
        }

        // 4: evict the profile entity by type+id
        if let Some(profile) = self.profile.data() {
            let id = profile.id.clone();
            self.cache.evict(PROFILE_TYPE, id.as_str()).await;
        }

        // 5: nothing cached from the logged-in session may remain visible
        self.cache.reset().await;
        self.profile.reset();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::config::ApiConfig;
    use crate::location::{Location, UNSAVED_LABEL};
    use crate::storage::{MemoryStore, keys};

    fn api_client() -> ApiClient {
        ApiClient::new(&ApiConfig {
            endpoint: "http://localhost:0/graphql".to_string(),
            api_version: "v1".to_string(),
        })
    }

    async fn logged_in_state(store: MemoryStore) -> UserState<MemoryStore> {
        store.set(keys::TOKEN, "tok-1").await.unwrap();
        UserState::load(store, api_client()).await.unwrap()
    }

    #[tokio::test]
    async fn test_is_logged_in_requires_token_and_profile() {
        let state = logged_in_state(MemoryStore::new()).await;
        // Token alone is not enough: no profile has been fetched
        assert!(state.session().has_token());
        assert!(!state.is_logged_in());
    }

    #[tokio::test]
    async fn test_logout_clears_token_and_persisted_copy() {
        let store = MemoryStore::new();
        let mut state = logged_in_state(store.clone()).await;

        state.logout().await;
        assert!(!state.session().has_token());
        assert!(!state.is_logged_in());
        assert!(store.raw(keys::TOKEN).await.is_none());
    }

    #[tokio::test]
    async fn test_logout_downgrades_saved_address() {
        let mut state = logged_in_state(MemoryStore::new()).await;
        state.location_mut().set(Location {
            label: "Home".to_string(),
            latitude: 48.2082,
            longitude: 16.3738,
            delivery_address: "Stephansplatz 1, Wien".to_string(),
            id: Some("addr-7".to_string()),
        });

        state.logout().await;

        let location = state.location().current().unwrap();
        assert_eq!(location.label, UNSAVED_LABEL);
        assert!(location.id.is_none());
        assert!((location.latitude - 48.2082).abs() < f64::EPSILON);
        assert_eq!(location.delivery_address, "Stephansplatz 1, Wien");
    }

    #[tokio::test]
    async fn test_logout_leaves_adhoc_location_alone() {
        let mut state = logged_in_state(MemoryStore::new()).await;
        let adhoc = Location {
            label: "Dropped pin".to_string(),
            latitude: 1.0,
            longitude: 2.0,
            delivery_address: "Somewhere".to_string(),
            id: None,
        };
        state.location_mut().set(adhoc.clone());

        state.logout().await;
        assert_eq!(state.location().current(), Some(&adhoc));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let store = MemoryStore::new();
        let mut state = logged_in_state(store.clone()).await;

        state.logout().await;
        state.logout().await;

        assert!(!state.session().has_token());
        assert!(!state.is_logged_in());
        assert!(store.raw(keys::TOKEN).await.is_none());
        assert!(state.profile().is_none());
    }

    #[tokio::test]
    async fn test_logout_when_never_logged_in() {
        let mut state = UserState::load(MemoryStore::new(), api_client())
            .await
            .unwrap();
        state.logout().await;
        assert!(!state.is_logged_in());
    }

    #[tokio::test]
    async fn test_set_token_allows_future_profile_fetches() {
        let mut state = UserState::load(MemoryStore::new(), api_client())
            .await
            .unwrap();
        state
            .session_mut()
            .set_token(SecretString::from("tok-2"))
            .await;
        assert!(state.session().has_token());

        // Fetch runs (and fails against the dead endpoint) but is recorded
        state.sync_profile().await;
        assert!(state.profile_fetcher().called());
        assert!(state.profile_fetcher().error().is_some());
        // A failed profile fetch is not a logout trigger
        assert!(state.session().has_token());
    }
}
