use std::sync::Arc;

use cache::{CacheKey, CacheStore, Revalidator};
use api_auth::GoogleToken;
use google::{Caller, Collection, GoogleClient};
use limiter::TierGate;

/// Everything a dashboard handler needs to talk to Google on a user's behalf.
pub struct Provider {
    pub google: GoogleClient,
    pub cache: Arc<dyn CacheStore>,
    pub tiers: TierGate,
    pub revalidator: Revalidator,
    /// Lifetime of cached listings in seconds.
    pub cache_ttl: u64,
}

/// Identity under which Google calls of `token`'s user are paced and authorized.
pub fn caller(token: &GoogleToken) -> Caller<'_> {
    Caller::new(&token.user_id, &token.access_token)
}

impl Provider {
    pub fn cache_key(&self, user_id: &str, collection: &Collection) -> CacheKey {
        CacheKey::new(user_id, collection.cache_segment())
    }

    /// Drops the user's cached listings of `collections` and asks the
    /// rendering layer to rebuild their pages. Failures are only logged.
    pub async fn invalidate(&self, user_id: &str, collections: &[Collection]) {
        if collections.is_empty() {
            return;
        }

        let keys: Vec<CacheKey> = collections
            .iter()
            .map(|collection| self.cache_key(user_id, collection))
            .collect();
        match self.cache.delete(&keys).await {
            Ok(removed) => log::debug!("Invalidated {} cached listing(s) of {}", removed, user_id),
            Err(e) => log::warn!("Failed to invalidate cache of {}: {}", user_id, e),
        }

        let mut paths: Vec<&str> = collections.iter().map(Collection::page_path).collect();
        paths.sort_unstable();
        paths.dedup();
        if let Err(e) = self.revalidator.revalidate(&paths).await {
            log::warn!("Revalidation after mutation failed: {}", e);
        }
    }
}
