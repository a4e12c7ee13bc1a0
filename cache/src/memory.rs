use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::error::Res;
use dashmap::DashMap;

use crate::{CacheKey, CacheStore};

/// In-process store for single-node deployments without Redis.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<CacheKey, (String, Instant)>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Res<Option<String>> {
        let now = Instant::now();
        let value = self
            .entries
            .get(key)
            .and_then(|entry| (entry.1 > now).then(|| entry.0.clone()));
        if value.is_none() {
            self.entries.remove_if(key, |_, (_, expires)| *expires <= now);
        }
        Ok(value)
    }

    async fn set(&self, key: &CacheKey, value: &str, ttl_secs: u64) -> Res<()> {
        let expires = Instant::now() + Duration::from_secs(ttl_secs);
        self.entries.insert(key.clone(), (value.to_string(), expires));
        Ok(())
    }

    async fn delete(&self, keys: &[CacheKey]) -> Res<u64> {
        Ok(keys
            .iter()
            .filter(|key| self.entries.remove(*key).is_some())
            .count() as u64)
    }

    async fn flush_user(&self, user_id: &str) -> Res<u64> {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.belongs_to(user_id));
        Ok((before - self.entries.len()) as u64)
    }
}
