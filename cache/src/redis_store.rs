use async_trait::async_trait;
use common::error::Res;
use redis::AsyncCommands;

use crate::{CacheKey, CacheStore};

const SCAN_BATCH: usize = 200;

/// Cache backed by a pool of Redis connections.
pub struct RedisCache {
    pool: deadpool_redis::Pool,
}

impl RedisCache {
    pub fn new(pool: deadpool_redis::Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &CacheKey) -> Res<Option<String>> {
        let mut conn = self.pool.get().await?;
        let value: Option<String> = conn.get(key.to_string()).await?;
        Ok(value)
    }

    async fn set(&self, key: &CacheKey, value: &str, ttl_secs: u64) -> Res<()> {
        let mut conn = self.pool.get().await?;
        let _: () = conn.set_ex(key.to_string(), value, ttl_secs).await?;
        Ok(())
    }

    async fn delete(&self, keys: &[CacheKey]) -> Res<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let names: Vec<String> = keys.iter().map(CacheKey::to_string).collect();
        let mut conn = self.pool.get().await?;
        let removed: u64 = conn.del(names).await?;
        Ok(removed)
    }

    async fn flush_user(&self, user_id: &str) -> Res<u64> {
        let pattern = CacheKey::user_pattern(user_id);
        let mut conn = self.pool.get().await?;

        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            if !batch.is_empty() {
                let deleted: u64 = conn.del(batch).await?;
                removed += deleted;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        log::debug!("Flushed {} cache entries for user {}", removed, user_id);
        Ok(removed)
    }
}
