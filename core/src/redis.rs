use std::sync::Arc;

use cache::{CacheStore, MemoryCache, RedisCache};
use common::env_config::Config;

/// Redis when `REDIS_URL` is set, the in-process store otherwise.
pub fn setup_cache(config: &Config) -> Arc<dyn CacheStore> {
    match &config.redis_url {
        Some(url) => {
            let cfg = deadpool_redis::Config::from_url(url);
            let pool = cfg
                .create_pool(Some(deadpool_redis::Runtime::Tokio1))
                .expect("Failed to create pool of Redis connections");
            log::info!("Caching Google listings in Redis");
            Arc::new(RedisCache::new(pool))
        }
        None => {
            log::warn!("REDIS_URL not set, caching Google listings in memory");
            Arc::new(MemoryCache::new())
        }
    }
}
