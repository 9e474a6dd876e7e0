//! Response cache for backend entities.
//!
//! Entities are keyed by `"{type}:{id}"` so a single stale entry can be
//! evicted on logout without touching the rest. The profile query itself is
//! network-only and is never served from here; the cache exists so
//! logged-out views can be forcibly cleared.

use moka::future::Cache;

use tiffin_core::UserId;

use crate::api::Profile;

/// Entity type tag for cached profiles.
pub const PROFILE_TYPE: &str = "Profile";

/// Cached entity variants.
#[derive(Debug, Clone)]
pub enum CachedEntity {
    Profile(Profile),
}

/// In-memory cache of backend responses.
#[derive(Clone)]
pub struct ResponseCache {
    cache: Cache<String, CachedEntity>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder().max_capacity(1000).build(),
        }
    }

    fn entity_key(entity_type: &str, id: &str) -> String {
        format!("{entity_type}:{id}")
    }

    /// Cache a fetched profile under its type+id key.
    pub async fn insert_profile(&self, profile: &Profile) {
        self.cache
            .insert(
                Self::entity_key(PROFILE_TYPE, profile.id.as_str()),
                CachedEntity::Profile(profile.clone()),
            )
            .await;
    }

    /// Read a cached profile, if present.
    pub async fn profile(&self, id: &UserId) -> Option<Profile> {
        match self
            .cache
            .get(&Self::entity_key(PROFILE_TYPE, id.as_str()))
            .await
        {
            Some(CachedEntity::Profile(profile)) => Some(profile),
            None => None,
        }
    }

    /// Evict one entity by type and id. Evicting an absent entry is a no-op.
    pub async fn evict(&self, entity_type: &str, id: &str) {
        self.cache
            .invalidate(&Self::entity_key(entity_type, id))
            .await;
    }

    /// Clear the entire cache so subsequent reads must refetch.
    pub async fn reset(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}
