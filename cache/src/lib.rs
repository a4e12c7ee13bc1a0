//! Listing cache shared by all dashboard handlers.
//!
//! Entries are JSON documents keyed per (user, collection). The Redis store is
//! used in deployments; the in-process store backs single-node setups without
//! Redis.

use async_trait::async_trait;
use common::error::Res;
use serde::{Serialize, de::DeserializeOwned};

pub mod keys;
pub mod memory;
pub mod redis_store;
pub mod revalidate;

pub use keys::CacheKey;
pub use memory::MemoryCache;
pub use redis_store::RedisCache;
pub use revalidate::Revalidator;

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Res<Option<String>>;

    async fn set(&self, key: &CacheKey, value: &str, ttl_secs: u64) -> Res<()>;

    /// Returns the number of entries that existed.
    async fn delete(&self, keys: &[CacheKey]) -> Res<u64>;

    /// Drops every entry in the user's namespace.
    async fn flush_user(&self, user_id: &str) -> Res<u64>;
}

/// Reads and decodes an entry. Undecodable entries are dropped and reported as a miss.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn CacheStore,
    key: &CacheKey,
) -> Res<Option<T>> {
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            log::warn!("Discarding corrupt cache entry {}: {}", key, e);
            store.delete(std::slice::from_ref(key)).await?;
            Ok(None)
        }
    }
}

pub async fn set_json<T: Serialize + ?Sized>(
    store: &dyn CacheStore,
    key: &CacheKey,
    value: &T,
    ttl_secs: u64,
) -> Res<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw, ttl_secs).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn json_helpers_round_trip_and_drop_corrupt_entries() {
        let store = MemoryCache::new();
        let key = CacheKey::new("user_1", "gtm:accounts");

        set_json(&store, &key, &vec!["a", "b"], 60).await.unwrap();
        let hit: Option<Vec<String>> = get_json(&store, &key).await.unwrap();
        assert_eq!(hit, Some(vec!["a".to_string(), "b".to_string()]));

        store.set(&key, "{not json", 60).await.unwrap();
        let miss: Option<Vec<String>> = get_json(&store, &key).await.unwrap();
        assert!(miss.is_none());
        assert!(store.get(&key).await.unwrap().is_none());
    }
}
